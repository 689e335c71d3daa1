pub mod ranges;
mod student;

use std::{
    fmt::{Display, Formatter},
    ops::RangeInclusive,
};

use average::Mean;
use chrono::NaiveDate;
use linfa::{Dataset, traits::Fit};
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::{
    prelude::*,
    quantity::{energy::KilowattHours, temperature::Celsius},
};

/// About three months of daily data.
pub const MIN_DATA_POINTS: usize = 90;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AnalysisError {
    #[error(
        "Insufficient data for correlation analysis: found {found} data points, but need at least {required} (approximately 3 months)"
    )]
    InsufficientData { found: usize, required: usize },
}

pub const fn ensure_sufficient(found: usize) -> Result<(), AnalysisError> {
    if found < MIN_DATA_POINTS {
        Err(AnalysisError::InsufficientData { found, required: MIN_DATA_POINTS })
    } else {
        Ok(())
    }
}

/// Complete day with its mean outdoor temperature.
#[derive(Copy, Clone, Debug)]
pub struct Observation {
    pub date: NaiveDate,
    pub temperature: Celsius,
    pub consumption: KilowattHours,
}

/// Ordinary least-squares fit of consumption against temperature.
#[derive(Copy, Clone, Debug)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,

    /// Two-sided, for the null hypothesis of zero slope.
    pub p_value: f64,
}

/// `consumption = a·T² + b·T + c`
#[derive(Copy, Clone, Debug)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticFit {
    pub fn at(&self, temperature: f64) -> f64 {
        self.a.mul_add(temperature * temperature, self.b.mul_add(temperature, self.c))
    }

    /// Comfort temperature and the consumption there.
    ///
    /// Only an upward parabola has a minimum.
    pub fn vertex(&self) -> Option<(Celsius, KilowattHours)> {
        (self.a > 0.0).then(|| {
            let temperature = -self.b / (2.0 * self.a);
            (Celsius(temperature), KilowattHours(self.at(temperature)))
        })
    }
}

#[must_use]
#[derive(Clone, Debug)]
pub struct Correlation {
    pub n_points: usize,

    /// Pearson correlation coefficient.
    pub pearson: f64,

    pub linear: LinearFit,
    pub quadratic: QuadraticFit,

    /// Observed temperatures, °C.
    pub temperatures: RangeInclusive<f64>,
}

impl Correlation {
    #[instrument(skip_all, fields(n_observations = observations.len()))]
    pub fn try_estimate(observations: &[Observation]) -> Result<Self> {
        ensure_sufficient(observations.len())?;

        let temperatures: Vec<f64> =
            observations.iter().map(|observation| observation.temperature.0).collect();
        let consumptions: Vec<f64> =
            observations.iter().map(|observation| observation.consumption.0).collect();

        let pearson = pearson(&temperatures, &consumptions)?;

        let linear = LinearRegression::new()
            .fit(&Dataset::new(
                Array2::from(temperatures.iter().map(|temperature| [*temperature]).collect::<Vec<_>>()),
                Array1::from(consumptions.clone()),
            ))
            .context("failed to fit the linear regression")?;

        let quadratic = LinearRegression::new()
            .fit(&Dataset::new(
                Array2::from(
                    temperatures
                        .iter()
                        .map(|temperature| [*temperature, temperature * temperature])
                        .collect::<Vec<_>>(),
                ),
                Array1::from(consumptions),
            ))
            .context("failed to fit the quadratic regression")?;

        #[allow(clippy::cast_precision_loss)]
        let degrees_of_freedom = (observations.len() - 2) as f64;
        let r_squared = (pearson * pearson).min(1.0);
        let t = pearson * (degrees_of_freedom / (1.0 - r_squared)).sqrt();

        let (min_temperature, max_temperature) = temperatures
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), temperature| {
                (min.min(*temperature), max.max(*temperature))
            });

        let this = Self {
            n_points: observations.len(),
            pearson,
            linear: LinearFit {
                slope: linear.params()[0],
                intercept: linear.intercept(),
                r_squared,
                p_value: student::two_sided_p_value(t, degrees_of_freedom),
            },
            quadratic: QuadraticFit {
                a: quadratic.params()[1],
                b: quadratic.params()[0],
                c: quadratic.intercept(),
            },
            temperatures: min_temperature..=max_temperature,
        };
        info!(pearson = this.pearson, p_value = this.linear.p_value, "estimated");
        Ok(this)
    }

    /// Strength of the linear relationship.
    pub fn strength(&self) -> &'static str {
        match self.pearson {
            r if r < -0.7 => "strong negative",
            r if r < -0.3 => "moderate negative",
            r if r < 0.0 => "weak negative",
            r if r < 0.3 => "weak positive",
            r if r < 0.7 => "moderate positive",
            _ => "strong positive",
        }
    }

    pub const fn interpretation(&self) -> Interpretation<'_> {
        Interpretation(self)
    }
}

impl Display for Correlation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pearson Correlation Coefficient: {:.4}", self.pearson)?;
        writeln!(f, "R-squared: {:.4}", self.linear.r_squared)?;
        writeln!(f, "P-value: {:.6}", self.linear.p_value)?;
        writeln!(
            f,
            "Linear equation: Consumption = {:.2} * Temperature + {:.2}",
            self.linear.slope, self.linear.intercept,
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Quadratic fit: Consumption = {:.4}*T² + {:.4}*T + {:.2}",
            self.quadratic.a, self.quadratic.b, self.quadratic.c,
        )?;
        match self.quadratic.vertex() {
            Some((temperature, consumption)) => {
                writeln!(f, "Optimal temperature (minimum consumption): {temperature:.1}")?;
                write!(f, "Minimum consumption at optimal temp: {consumption:.1}")
            }
            None => write!(f, "Optimal temperature (minimum consumption): none, the fitted curve has no minimum"),
        }
    }
}

/// Plain-language reading of the correlation.
pub struct Interpretation<'a>(&'a Correlation);

impl Display for Interpretation<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "The correlation coefficient of {:.4} indicates a {} linear relationship.",
            self.0.pearson,
            self.0.strength(),
        )?;
        writeln!(f)?;
        match self.0.quadratic.vertex() {
            Some((temperature, _)) => {
                writeln!(f, "The quadratic fit reveals a U-shaped relationship:")?;
                writeln!(f, "- Optimal (comfortable) temperature: {temperature:.1}")?;
                writeln!(f, "- Below {temperature:.1}: Heating increases consumption")?;
                writeln!(f, "- Above {temperature:.1}: Cooling increases consumption")?;
                write!(f, "- Minimum consumption occurs at the optimal temperature")
            }
            None => write!(
                f,
                "The quadratic fit is not U-shaped, so there is no comfort temperature within the data.",
            ),
        }
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    let mean_x = xs.iter().copied().collect::<Mean>().mean();
    let mean_y = ys.iter().copied().collect::<Mean>().mean();
    let (covariance, variance_x, variance_y) = xs.iter().zip(ys).fold(
        (0.0, 0.0, 0.0),
        |(covariance, variance_x, variance_y), (x, y)| {
            let (dx, dy) = (x - mean_x, y - mean_y);
            (dx.mul_add(dy, covariance), dx.mul_add(dx, variance_x), dy.mul_add(dy, variance_y))
        },
    );
    ensure!(variance_x > 0.0, "temperature does not vary");
    ensure!(variance_y > 0.0, "consumption does not vary");
    Ok(covariance / (variance_x * variance_y).sqrt())
}
