mod consumption;
mod correlation;
pub mod font;
mod hatch;

use std::ops::Range;

use plotters::style::RGBColor;

pub use self::{consumption::ConsumptionChart, correlation::CorrelationChart};

/// Output image size in pixels.
const SIZE: (u32, u32) = (1600, 800);

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const DARK_STEEL_BLUE: RGBColor = RGBColor(31, 78, 121);
const ORANGE_RED: RGBColor = RGBColor(255, 69, 0);
const WHEAT: RGBColor = RGBColor(245, 222, 179);

/// Value range with a 10% margin on each side.
fn padded_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let initial = if include_zero { (0.0, 0.0) } else { (f64::INFINITY, f64::NEG_INFINITY) };
    let (min, max) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold(initial, |(min, max), value| (min.min(value), max.max(value)));
    if min > max {
        return 0.0..1.0;
    }
    let margin = if max > min { (max - min) * 0.1 } else { 1.0 };
    let lower = if include_zero && min >= 0.0 { 0.0 } else { min - margin };
    lower..(max + margin)
}

/// Tick label of the bar at the integer position, empty between the bars.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tick_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}
