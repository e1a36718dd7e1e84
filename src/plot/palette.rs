//! Chart colors.

use plotters::style::RGBColor;

/// Ten-color categorical palette (seaborn "muted").
pub const MUTED: [RGBColor; 10] = [
    RGBColor(72, 120, 208),
    RGBColor(238, 133, 74),
    RGBColor(106, 204, 100),
    RGBColor(214, 95, 95),
    RGBColor(149, 108, 180),
    RGBColor(140, 97, 60),
    RGBColor(220, 126, 192),
    RGBColor(121, 121, 121),
    RGBColor(213, 187, 103),
    RGBColor(130, 198, 226),
];

/// Passed segments in grouped stacked charts, cycled by source file index.
pub const GREEN_SHADES: [RGBColor; 3] = [RGBColor(102, 194, 165), RGBColor(65, 174, 118), RGBColor(35, 139, 69)];

/// Failed segments in grouped stacked charts, cycled by source file index.
pub const RED_SHADES: [RGBColor; 3] = [RGBColor(252, 146, 114), RGBColor(251, 106, 74), RGBColor(203, 24, 29)];

pub const PASSED: RGBColor = RGBColor(0, 128, 0);
pub const FAILED: RGBColor = RGBColor(255, 0, 0);

pub fn muted(idx: usize) -> RGBColor {
    MUTED[idx % MUTED.len()]
}
