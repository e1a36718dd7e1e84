//! Chart figures.
//!
//! Builders in this module turn aggregations into plain figure descriptions
//! (categories, bar series, pie panels). They do no drawing, which keeps layout
//! decisions testable; `png` renders a figure with Plotters.
//!
//! Bar layout: category `i` is centred on `x = i`. A group of `n` side-by-side
//! bars of width `w` places bar `j` at `i + (j - n/2)·w + w/2`.

use plotters::style::RGBColor;

use crate::report::{FlakinessCounts, MetricByTest, OutcomesByTest};

pub mod palette;
pub mod png;

pub use png::{render_bar_figure, render_pie_figure};

/// Bar width used when a category holds one group of hue bars.
const GROUP_WIDTH: f64 = 0.8;
/// Width of each stacked bar in the grouped stacked chart.
const GROUPED_STACKED_BAR_WIDTH: f64 = 0.1;
const PIE_COLUMNS: usize = 3;
const PIE_PANEL_SIZE: (u32, u32) = (400, 400);
const PIE_TITLE_BAND: u32 = 60;

/// Bars over categorical x positions.
#[derive(Debug, Clone)]
pub struct BarFigure {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// Output size in pixels.
    pub size: (u32, u32),
    pub categories: Vec<String>,
    pub bar_width: f64,
    pub series: Vec<BarSeries>,
}

/// One legend entry: a bar (or stacked segment) per category.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub label: String,
    pub color: RGBColor,
    /// Horizontal offset from the category centre.
    pub offset: f64,
    pub values: Vec<f64>,
    /// Where each bar starts; zeros unless stacked on another series.
    pub bottoms: Vec<f64>,
}

impl BarSeries {
    fn new(label: impl Into<String>, color: RGBColor, offset: f64, values: Vec<f64>) -> Self {
        let bottoms = vec![0.0; values.len()];
        Self {
            label: label.into(),
            color,
            offset,
            values,
            bottoms,
        }
    }

    fn stacked_on(mut self, bottoms: Vec<f64>) -> Self {
        self.bottoms = bottoms;
        self
    }
}

impl BarFigure {
    /// Highest bar top across all series.
    pub fn y_max(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().zip(&s.bottoms).map(|(v, b)| v + b))
            .fold(0.0, f64::max)
    }
}

/// A grid of pies sharing one title.
#[derive(Debug, Clone)]
pub struct PieFigure {
    pub title: String,
    pub columns: usize,
    pub panel_size: (u32, u32),
    pub panels: Vec<PiePanel>,
}

#[derive(Debug, Clone)]
pub struct PiePanel {
    pub title: String,
    pub slices: Vec<(String, f64)>,
}

impl PieFigure {
    pub fn rows(&self) -> usize {
        self.panels.len().div_ceil(self.columns.max(1))
    }

    pub fn size(&self) -> (u32, u32) {
        let rows = self.rows().max(1) as u32;
        (
            self.columns as u32 * self.panel_size.0,
            rows * self.panel_size.1 + PIE_TITLE_BAND,
        )
    }
}

/// Offset of bar `slot` within a group of `slots` bars of width `width`.
pub fn slot_offset(slot: usize, slots: usize, width: f64) -> f64 {
    (slot as f64 - slots as f64 / 2.0) * width + width / 2.0
}

/// One bar per source file within each test, for a single count column.
pub fn metric_figure(agg: &MetricByTest, title: Option<&str>) -> BarFigure {
    let slots = agg.sources.len().max(1);
    let width = GROUP_WIDTH / slots as f64;

    let series = agg
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let values = agg.tests.iter().map(|test| agg.get(test, source)).collect();
            BarSeries::new(source.as_str(), palette::muted(i), slot_offset(i, slots, width), values)
        })
        .collect();

    BarFigure {
        title: title
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} per Test (by CSV File)", agg.column)),
        x_desc: "Test Name".to_string(),
        y_desc: format!("{} Count", agg.column),
        size: (1200, 600),
        categories: agg.tests.clone(),
        bar_width: width,
        series,
    }
}

/// One bar per (test, source file) pair with Failed stacked on Passed.
pub fn stacked_figure(agg: &OutcomesByTest, title: Option<&str>) -> BarFigure {
    let categories = agg
        .cells
        .keys()
        .map(|(test, source)| format!("{test} ({source})"))
        .collect();
    let passed: Vec<f64> = agg.cells.values().map(|c| c.passed).collect();
    let failed: Vec<f64> = agg.cells.values().map(|c| c.failed).collect();

    let series = vec![
        BarSeries::new("Passed", palette::PASSED, 0.0, passed.clone()),
        BarSeries::new("Failed", palette::FAILED, 0.0, failed).stacked_on(passed),
    ];

    BarFigure {
        title: title
            .map(str::to_string)
            .unwrap_or_else(|| format!("Test Outcomes ({})", agg.ordering.suffix())),
        x_desc: String::new(),
        y_desc: "Test Count".to_string(),
        size: (1200, 600),
        categories,
        bar_width: GROUP_WIDTH,
        series,
    }
}

/// One group per test; within it one Passed/Failed stacked bar per source file.
pub fn grouped_stacked_figure(agg: &OutcomesByTest, title: Option<&str>) -> BarFigure {
    let slots = agg.sources.len();
    let width = GROUPED_STACKED_BAR_WIDTH;

    let mut series = Vec::with_capacity(slots * 2);
    for (i, source) in agg.sources.iter().enumerate() {
        let counts: Vec<_> = agg.tests.iter().map(|test| agg.get(test, source)).collect();
        let passed: Vec<f64> = counts.iter().map(|c| c.passed).collect();
        let failed: Vec<f64> = counts.iter().map(|c| c.failed).collect();
        let offset = slot_offset(i, slots, width);

        series.push(BarSeries::new(
            format!("{source} - Passed"),
            palette::GREEN_SHADES[i % palette::GREEN_SHADES.len()],
            offset,
            passed.clone(),
        ));
        series.push(
            BarSeries::new(
                format!("{source} - Failed"),
                palette::RED_SHADES[i % palette::RED_SHADES.len()],
                offset,
                failed,
            )
            .stacked_on(passed),
        );
    }

    BarFigure {
        title: title.map(str::to_string).unwrap_or_else(|| {
            format!(
                "Passed and Failed ({}) per Test and Source File",
                agg.ordering.suffix()
            )
        }),
        x_desc: String::new(),
        y_desc: "Test Count".to_string(),
        size: (1400, 600),
        categories: agg.tests.clone(),
        bar_width: width,
        series,
    }
}

/// Classification counts with one group per source file.
pub fn flakiness_bar_figure(counts: &FlakinessCounts) -> BarFigure {
    let slots = counts.categories.len().max(1);
    let width = GROUP_WIDTH / slots as f64;

    let series = counts
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let values = counts
                .sources
                .iter()
                .map(|source| counts.get(source, category) as f64)
                .collect();
            BarSeries::new(category.as_str(), palette::muted(i), slot_offset(i, slots, width), values)
        })
        .collect();

    BarFigure {
        title: "Flakiness Type Count per CSV File".to_string(),
        x_desc: "Source File".to_string(),
        y_desc: "Number of Tests".to_string(),
        size: (1200, 600),
        categories: counts.sources.clone(),
        bar_width: width,
        series,
    }
}

/// One classification pie per source file.
pub fn flakiness_pie_figure(counts: &FlakinessCounts) -> PieFigure {
    let panels = counts
        .sources
        .iter()
        .map(|source| PiePanel {
            title: source.clone(),
            slices: counts
                .for_source(source)
                .into_iter()
                .map(|(category, n)| (category.to_string(), n as f64))
                .collect(),
        })
        .collect();

    PieFigure {
        title: "Flakiness Distribution per File".to_string(),
        columns: PIE_COLUMNS,
        panel_size: PIE_PANEL_SIZE,
        panels,
    }
}
