//! PNG rendering with Plotters.
//!
//! All layout is decided by the figure builders; these functions only map a
//! `BarFigure` / `PieFigure` onto a bitmap and write it out.

use std::error::Error;
use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;

use super::palette;
use super::{BarFigure, PieFigure};
use crate::error::AppError;
use crate::report::truncate;

const FONT: &str = "sans-serif";
/// Longest x tick label before truncation.
const MAX_TICK_LABEL: usize = 40;

type DrawResult = Result<(), Box<dyn Error>>;

/// Draw a bar figure and write it to `path` as PNG.
pub fn render_bar_figure(fig: &BarFigure, path: &Path) -> Result<(), AppError> {
    draw_bars(fig, path)
        .map_err(|e| AppError::output(format!("Failed to render chart '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), title = %fig.title, "wrote chart");
    Ok(())
}

/// Draw a pie grid and write it to `path` as PNG.
pub fn render_pie_figure(fig: &PieFigure, path: &Path) -> Result<(), AppError> {
    draw_pies(fig, path)
        .map_err(|e| AppError::output(format!("Failed to render chart '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), title = %fig.title, "wrote chart");
    Ok(())
}

fn draw_bars(fig: &BarFigure, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, fig.size).into_drawing_area();
    root.fill(&WHITE)?;

    let n = fig.categories.len().max(1);
    let y_max = y_upper_bound(fig.y_max());
    let rotate = needs_rotated_labels(&fig.categories);

    let mut chart = ChartBuilder::on(&root)
        .caption(&fig.title, (FONT, 24))
        .margin(15)
        .x_label_area_size(x_label_area_size(&fig.categories, rotate))
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..n as f64 - 0.5, 0f64..y_max)?;

    let tick_font = (FONT, 12).into_font();
    let tick_font = if rotate {
        tick_font.transform(FontTransform::Rotate90)
    } else {
        tick_font
    };

    let categories = &fig.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(x_tick_count(categories.len()))
        .x_desc(fig.x_desc.as_str())
        .y_desc(fig.y_desc.as_str())
        .x_label_style(tick_font)
        .x_label_formatter(&|v| category_label(categories, *v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    let half = fig.bar_width / 2.0;
    for series in &fig.series {
        let color = series.color;
        let bars = series
            .values
            .iter()
            .zip(&series.bottoms)
            .enumerate()
            .filter(|(_, (v, _))| **v > 0.0)
            .map(move |(i, (v, b))| {
                let x = i as f64 + series.offset;
                Rectangle::new([(x - half, *b), (x + half, b + v)], color.filled())
            });

        chart
            .draw_series(bars)?
            .label(series.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    if !fig.series.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, 12))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_pies(fig: &PieFigure, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, fig.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let body = root.titled(&fig.title, (FONT, 28))?;
    let cells = body.split_evenly((fig.rows().max(1), fig.columns.max(1)));

    // Cells past the last panel stay blank.
    for (cell, panel) in cells.iter().zip(&fig.panels) {
        let area = cell.titled(&truncate(&panel.title, MAX_TICK_LABEL), (FONT, 14))?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.32;

        let sizes: Vec<f64> = panel.slices.iter().map(|(_, v)| *v).collect();
        let labels: Vec<&str> = panel.slices.iter().map(|(l, _)| l.as_str()).collect();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(palette::muted).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style((FONT, 12).into_font().color(&BLACK));
        pie.percentages((FONT, 11).into_font().color(&WHITE));
        area.draw(&pie)?;
    }

    root.present()?;
    Ok(())
}

fn y_upper_bound(y_max: f64) -> f64 {
    // Headroom keeps the legend clear of the tallest bar.
    if y_max > 0.0 { y_max * 1.15 } else { 1.0 }
}

/// Ticks every half step so each category centre gets one.
fn x_tick_count(categories: usize) -> usize {
    categories.max(1) * 2 + 1
}

fn needs_rotated_labels(categories: &[String]) -> bool {
    categories.len() > 6 || categories.iter().any(|c| c.chars().count() > 16)
}

fn x_label_area_size(categories: &[String], rotate: bool) -> i32 {
    if !rotate {
        return 50;
    }
    let longest = categories
        .iter()
        .map(|c| c.chars().count().min(MAX_TICK_LABEL))
        .max()
        .unwrap_or(0) as i32;
    (longest * 7 + 30).min(300)
}

/// Tick label for a category position; positions between categories are blank.
fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories
        .get(idx as usize)
        .map(|c| truncate(c, MAX_TICK_LABEL))
        .unwrap_or_default()
}
