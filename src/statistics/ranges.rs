use average::Variance;

use crate::statistics::Observation;

/// Right-closed temperature interval `(lower, upper]`.
pub struct TemperatureRange {
    pub label: &'static str,
    lower: f64,
    upper: f64,
}

impl TemperatureRange {
    const fn new(label: &'static str, lower: f64, upper: f64) -> Self {
        Self { label, lower, upper }
    }

    pub fn contains(&self, temperature: f64) -> bool {
        self.lower < temperature && temperature <= self.upper
    }
}

pub const TEMPERATURE_RANGES: [TemperatureRange; 6] = [
    TemperatureRange::new("<5°C", -10.0, 5.0),
    TemperatureRange::new("5-10°C", 5.0, 10.0),
    TemperatureRange::new("10-15°C", 10.0, 15.0),
    TemperatureRange::new("15-20°C", 15.0, 20.0),
    TemperatureRange::new("20-25°C", 20.0, 25.0),
    TemperatureRange::new(">25°C", 25.0, 30.0),
];

/// Daily consumption statistics within a temperature range.
#[derive(Debug, PartialEq)]
pub struct RangeSummary {
    pub label: &'static str,
    pub mean: f64,

    /// Sample standard deviation, undefined for a single observation.
    pub std: Option<f64>,

    pub count: u64,
}

/// Summarize the consumption per temperature range, omitting the empty ranges.
///
/// Observations outside all the ranges are ignored.
pub fn summarize(observations: &[Observation]) -> Vec<RangeSummary> {
    TEMPERATURE_RANGES
        .iter()
        .filter_map(|range| {
            let variance: Variance = observations
                .iter()
                .filter(|observation| range.contains(observation.temperature.0))
                .map(|observation| observation.consumption.0)
                .collect();
            if variance.is_empty() {
                return None;
            }
            Some(RangeSummary {
                label: range.label,
                mean: variance.mean(),
                std: (variance.len() >= 2).then(|| variance.sample_variance().sqrt()),
                count: variance.len(),
            })
        })
        .collect()
}
