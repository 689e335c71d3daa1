use std::path::Path;

use bon::Builder;
use itertools::Itertools;
use plotters::{coord::Shift, prelude::*};

use crate::{
    chart::{SIZE, STEEL_BLUE, WHEAT, font::FAMILY, padded_range},
    prelude::*,
    statistics::{Correlation, Observation},
};

const N_CURVE_POINTS: usize = 100;

/// Temperature against daily consumption, with the quadratic fit.
#[derive(Builder)]
pub struct CorrelationChart<'a> {
    observations: &'a [Observation],
    correlation: &'a Correlation,

    /// Whether a font is available.
    has_text: bool,
}

impl CorrelationChart<'_> {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn render(&self, path: &Path) -> Result {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = if self.has_text {
            root.titled(
                "Temperature vs Daily Electricity Consumption",
                (FAMILY, 28).into_font().style(FontStyle::Bold),
            )?
            .titled("(Quadratic Relationship)", (FAMILY, 20))?
        } else {
            root
        };

        let curve = self.curve();
        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.has_text {
            builder.x_label_area_size(60).y_label_area_size(90);
        }
        let mut chart = builder.build_cartesian_2d(
            padded_range(self.observations.iter().map(|observation| observation.temperature.0), false),
            padded_range(
                self.observations
                    .iter()
                    .map(|observation| observation.consumption.0)
                    .chain(curve.iter().map(|(_, consumption)| *consumption)),
                true,
            ),
        )?;

        if self.has_text {
            chart
                .configure_mesh()
                .bold_line_style(BLACK.mix(0.1))
                .light_line_style(TRANSPARENT)
                .x_desc("Temperature (°C)")
                .y_desc("Net Consumption (kWh) per day")
                .axis_desc_style((FAMILY, 18).into_font().style(FontStyle::Bold))
                .label_style((FAMILY, 14))
                .draw()?;
        }

        chart
            .draw_series(self.observations.iter().map(|observation| {
                Circle::new(
                    (observation.temperature.0, observation.consumption.0),
                    5,
                    STEEL_BLUE.mix(0.6).filled(),
                )
            }))?
            .label("Daily consumption data")
            .legend(|(x, y)| Circle::new((x + 8, y), 5, STEEL_BLUE.mix(0.6).filled()));
        chart.draw_series(self.observations.iter().map(|observation| {
            Circle::new(
                (observation.temperature.0, observation.consumption.0),
                5,
                BLACK.mix(0.6).stroke_width(1),
            )
        }))?;
        chart
            .draw_series(LineSeries::new(curve, RED.stroke_width(2)))?
            .label("Quadratic fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED.stroke_width(2)));

        if self.has_text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FAMILY, 14))
                .draw()?;
            self.draw_summary(&chart.plotting_area().strip_coord_spec())?;
        }

        root.present().with_context(|| format!("failed to save `{}`", path.display()))?;
        debug!("rendered");
        Ok(())
    }

    /// Fitted consumption over the observed temperatures.
    #[allow(clippy::cast_precision_loss)]
    fn curve(&self) -> Vec<(f64, f64)> {
        let (since, until) =
            (*self.correlation.temperatures.start(), *self.correlation.temperatures.end());
        let step = (until - since) / (N_CURVE_POINTS - 1) as f64;
        (0..N_CURVE_POINTS)
            .map(|index| {
                let temperature = (index as f64).mul_add(step, since);
                (temperature, self.correlation.quadratic.at(temperature))
            })
            .collect()
    }

    fn summary_lines(&self) -> Vec<String> {
        let correlation = self.correlation;
        let fit = correlation.quadratic;
        let mut lines = vec![
            format!("Quadratic fit: y = {:.4}x² + {:.4}x + {:.1}", fit.a, fit.b, fit.c),
            format!("Correlation: {:.4}", correlation.pearson),
            format!("R²: {:.4}", correlation.linear.r_squared),
            format!(
                "Data range: {:.1}°C to {:.1}°C",
                correlation.temperatures.start(),
                correlation.temperatures.end(),
            ),
        ];
        let dates = self.observations.iter().map(|observation| observation.date).minmax();
        if let Some((since, until)) = dates.into_option() {
            lines.push(format!("Period: {since} to {until}"));
        }
        lines
    }

    /// Statistics box in the upper left corner of the plotting area.
    fn draw_summary(&self, area: &DrawingArea<BitMapBackend<'_>, Shift>) -> Result {
        const LINE_HEIGHT: i32 = 22;
        const PADDING: i32 = 10;
        const ORIGIN: (i32, i32) = (20, 20);

        let lines = self.summary_lines();
        let style = TextStyle::from((FAMILY, 16).into_font()).color(&BLACK);
        let mut width = 0;
        for line in &lines {
            width = width.max(area.estimate_text_size(line, &style)?.0);
        }
        let height = LINE_HEIGHT * i32::try_from(lines.len())?;
        let width = i32::try_from(width)?;

        area.draw(&Rectangle::new(
            [ORIGIN, (ORIGIN.0 + width + 2 * PADDING, ORIGIN.1 + height + 2 * PADDING)],
            WHEAT.mix(0.5).filled(),
        ))?;
        for (index, line) in (0..).zip(&lines) {
            area.draw_text(line, &style, (ORIGIN.0 + PADDING, ORIGIN.1 + PADDING + index * LINE_HEIGHT))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::quantity::{energy::KilowattHours, temperature::Celsius};

    fn observations() -> Vec<Observation> {
        let since = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..100)
            .map(|day| {
                let temperature = -5.0 + 0.3 * f64::from(day);
                Observation {
                    date: since + TimeDelta::days(i64::from(day)),
                    temperature: Celsius(temperature),
                    consumption: KilowattHours(0.2 * (temperature - 16.0).powi(2) + 12.0),
                }
            })
            .collect()
    }

    #[test]
    fn test_curve_spans_observed_temperatures() -> Result {
        let observations = observations();
        let correlation = Correlation::try_estimate(&observations)?;
        let chart = CorrelationChart::builder()
            .observations(&observations)
            .correlation(&correlation)
            .has_text(false)
            .build();
        let curve = chart.curve();
        assert_eq!(curve.len(), N_CURVE_POINTS);
        assert_abs_diff_eq!(curve[0].0, -5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curve[N_CURVE_POINTS - 1].0, 24.7, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_summary_lines() -> Result {
        let observations = observations();
        let correlation = Correlation::try_estimate(&observations)?;
        let chart = CorrelationChart::builder()
            .observations(&observations)
            .correlation(&correlation)
            .has_text(false)
            .build();
        let lines = chart.summary_lines();
        assert!(lines[0].starts_with("Quadratic fit: y = 0.2000x²"), "{}", lines[0]);
        assert_eq!(lines[3], "Data range: -5.0°C to 24.7°C");
        assert_eq!(lines[4], "Period: 2025-01-01 to 2025-04-10");
        Ok(())
    }

    #[test]
    fn test_render_without_text() -> Result {
        let observations = observations();
        let correlation = Correlation::try_estimate(&observations)?;
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("correlation.png");
        CorrelationChart::builder()
            .observations(&observations)
            .correlation(&correlation)
            .has_text(false)
            .build()
            .render(&path)?;
        assert!(path.is_file());
        Ok(())
    }
}
