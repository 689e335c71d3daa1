use std::{ops::RangeInclusive, path::Path};

use bon::Builder;
use chrono::NaiveDate;
use itertools::Itertools;
use plotters::{
    chart::DualCoordChartContext,
    coord::{Shift, cartesian::Cartesian2d, types::RangedCoordf64},
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use crate::{
    chart::{
        DARK_STEEL_BLUE, ORANGE_RED, SIZE, STEEL_BLUE, font::FAMILY, hatch, padded_range,
        tick_label,
    },
    core::{aggregate::Aggregation, bucket::Bucket, granularity::Granularity, period::Period},
    input::Site,
    prelude::*,
    quantity::temperature::Celsius,
};

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;

type Chart<'a, 'b> = DualCoordChartContext<
    'a,
    BitMapBackend<'b>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
>;

const BAR_WIDTH: f64 = 0.8;
const N_HATCH_STROKES: usize = 4;

/// Value labels are only drawn while they fit above the bars.
const MAX_VALUE_LABELS: usize = 62;

const MAX_X_LABELS: usize = 31;

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Consumption bars with the temperature line on the secondary axis.
#[derive(Builder)]
pub struct ConsumptionChart<'a> {
    aggregation: &'a Aggregation,

    /// Aligned with the aggregation buckets.
    temperatures: Option<&'a [Option<Celsius>]>,

    site: &'a Site,
    dates: &'a RangeInclusive<NaiveDate>,

    /// Whether a font is available.
    has_text: bool,
}

impl ConsumptionChart<'_> {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn render(&self, path: &Path) -> Result {
        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = if self.has_text {
            root.titled(&self.title(), (FAMILY, 28).into_font().style(FontStyle::Bold))?
                .titled(&self.subtitle(), (FAMILY, 20))?
        } else {
            root
        };
        if self.aggregation.is_multi_year() {
            self.draw_multi_year(&root)?;
        } else {
            self.draw_sequential(&root)?;
        }
        root.present().with_context(|| format!("failed to save `{}`", path.display()))?;
        debug!("rendered");
        Ok(())
    }

    fn title(&self) -> String {
        let has_temperature = self.temperatures.is_some();
        if self.aggregation.is_hour_profile() {
            if has_temperature {
                "Electricity Utilization and Temperature by Hour".to_string()
            } else {
                "Electricity Utilization by Hour".to_string()
            }
        } else if has_temperature {
            format!("{} Electricity Consumption and Temperature", self.aggregation.granularity.title())
        } else {
            format!("{} Electricity Consumption", self.aggregation.granularity.title())
        }
    }

    fn subtitle(&self) -> String {
        let (since, until) = (self.dates.start(), self.dates.end());
        if since == until {
            format!("{} - {since}", self.site)
        } else {
            format!("{} - {since} to {until}", self.site)
        }
    }

    const fn x_description(&self) -> &'static str {
        match self.aggregation.granularity {
            Granularity::Hourly => "Hour of Day",
            Granularity::Daily => "Date",
            Granularity::Weekly => "Week Starting",
            Granularity::Monthly => "Month",
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_sequential(&self, root: &Area) -> Result {
        let buckets = &self.aggregation.buckets;
        let x_range = -0.5..(buckets.len() as f64 - 0.5);
        let temperature_points: Vec<(f64, f64)> = self
            .temperatures
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, temperature)| temperature.map(|it| (index as f64, it.0)))
            .collect();

        let mut chart = self.build_chart(
            root,
            x_range,
            buckets.iter().map(|bucket| bucket.consumption.0),
            temperature_points.iter().map(|(_, temperature)| *temperature),
        )?;
        let labels = buckets.iter().map(|bucket| bucket.period.tick_label()).collect_vec();
        self.draw_axes(&mut chart, &labels, !temperature_points.is_empty())?;

        let half_width = BAR_WIDTH / 2.0;
        let corners = |index: usize, bucket: &Bucket| {
            let x = index as f64;
            [(x - half_width, 0.0), (x + half_width, bucket.consumption.0)]
        };
        chart
            .draw_series(
                buckets
                    .iter()
                    .enumerate()
                    .map(|(index, bucket)| Rectangle::new(corners(index, bucket), bar_style(bucket))),
            )?
            .label("Net Consumption")
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], STEEL_BLUE.mix(0.7).filled()));
        chart.draw_series(buckets.iter().enumerate().map(|(index, bucket)| {
            Rectangle::new(corners(index, bucket), BLACK.stroke_width(1))
        }))?;
        chart.draw_series(
            buckets
                .iter()
                .enumerate()
                .filter(|(_, bucket)| !bucket.is_complete)
                .flat_map(|(index, bucket)| {
                    let [from, to] = corners(index, bucket);
                    hatch::strokes(from, to, N_HATCH_STROKES)
                })
                .map(|[from, to]| PathElement::new(vec![from, to], BLACK.mix(0.6).stroke_width(1))),
        )?;

        if buckets.iter().any(|bucket| !bucket.is_complete) {
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label("Incomplete period")
                .legend(|(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 16, y + 6)], STEEL_BLUE.mix(0.3).filled())
                });
        }
        if buckets.iter().any(Bucket::is_shaded) {
            let label = if self.aggregation.is_hour_profile() {
                "Overnight (22:00-06:00)"
            } else {
                "Weekend"
            };
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(label)
                .legend(|(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 16, y + 6)], DARK_STEEL_BLUE.mix(0.8).filled())
                });
        }

        let has_value_labels = self.has_text && buckets.len() <= MAX_VALUE_LABELS;
        if has_value_labels {
            let style = (FAMILY, 12).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(buckets.iter().enumerate().map(|(index, bucket)| {
                Text::new(
                    format!("{:.1}", bucket.consumption.0),
                    (index as f64, bucket.consumption.0),
                    style.clone(),
                )
            }))?;
        }

        if !temperature_points.is_empty() {
            chart
                .draw_secondary_series(LineSeries::new(
                    temperature_points.iter().copied(),
                    ORANGE_RED.stroke_width(3),
                ))?
                .label("Temperature (°C)")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], ORANGE_RED.stroke_width(3)));
            chart.draw_secondary_series(
                temperature_points.iter().map(|point| Circle::new(*point, 4, ORANGE_RED.filled())),
            )?;
            if has_value_labels {
                let style =
                    (FAMILY, 11).into_font().color(&ORANGE_RED).pos(Pos::new(HPos::Center, VPos::Bottom));
                chart.draw_secondary_series(temperature_points.iter().map(|(x, temperature)| {
                    Text::new(format!("{temperature:.1}°C"), (*x, *temperature), style.clone())
                }))?;
            }
        }

        self.draw_legend(&mut chart)
    }

    /// Calendar months on the x axis, one bar and one temperature line per year.
    #[allow(clippy::cast_precision_loss)]
    fn draw_multi_year(&self, root: &Area) -> Result {
        let buckets = &self.aggregation.buckets;
        let years = buckets.iter().filter_map(|bucket| bucket.period.year()).unique().sorted().collect_vec();
        let bar_width = BAR_WIDTH / years.len() as f64;

        // Bar centre for the bucket month and year.
        let position = |period: Period| -> Option<(usize, f64)> {
            let Period::Month { year, month } = period else {
                return None;
            };
            let year_index = years.iter().position(|it| *it == year)?;
            let x = f64::from(month - 1) - BAR_WIDTH / 2.0 + bar_width * (year_index as f64 + 0.5);
            Some((year_index, x))
        };

        let temperatures = self.temperatures.unwrap_or_default();
        let temperature_of = |index: usize| temperatures.get(index).copied().flatten();

        let mut chart = self.build_chart(
            root,
            -0.5..11.5,
            buckets.iter().map(|bucket| bucket.consumption.0),
            temperatures.iter().flatten().map(|temperature| temperature.0),
        )?;
        let labels = MONTHS.iter().map(ToString::to_string).collect_vec();
        let has_temperature = temperatures.iter().any(Option::is_some);
        self.draw_axes(&mut chart, &labels, has_temperature)?;

        for (year_index, year) in years.iter().enumerate() {
            let color = Palette99::pick(year_index).to_rgba();
            let bars = buckets
                .iter()
                .enumerate()
                .filter_map(|(index, bucket)| {
                    let (bucket_year_index, x) = position(bucket.period)?;
                    (bucket_year_index == year_index).then_some((index, x, bucket))
                })
                .collect_vec();

            chart
                .draw_series(bars.iter().map(|(_, x, bucket)| {
                    Rectangle::new(
                        [(x - bar_width / 2.0, 0.0), (x + bar_width / 2.0, bucket.consumption.0)],
                        color.mix(0.8).filled(),
                    )
                }))?
                .label(format!("{year} consumption"))
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.mix(0.8).filled()));
            chart.draw_series(bars.iter().map(|(_, x, bucket)| {
                Rectangle::new(
                    [(x - bar_width / 2.0, 0.0), (x + bar_width / 2.0, bucket.consumption.0)],
                    BLACK.stroke_width(1),
                )
            }))?;

            let points = bars
                .iter()
                .filter_map(|(index, x, _)| temperature_of(*index).map(|it| (*x, it.0)))
                .collect_vec();
            if !points.is_empty() {
                chart
                    .draw_secondary_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                    .label(format!("{year} temperature"))
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
                chart.draw_secondary_series(
                    points.iter().map(|point| Circle::new(*point, 4, color.filled())),
                )?;
            }
        }

        self.draw_legend(&mut chart)
    }

    fn build_chart<'a, 'b: 'a>(
        &self,
        root: &'a Area<'b>,
        x_range: std::ops::Range<f64>,
        consumptions: impl Iterator<Item = f64>,
        temperatures: impl Iterator<Item = f64>,
    ) -> Result<Chart<'a, 'b>> {
        let mut builder = ChartBuilder::on(root);
        builder.margin(20);
        if self.has_text {
            builder.x_label_area_size(60).y_label_area_size(90).right_y_label_area_size(90);
        }
        Ok(builder
            .build_cartesian_2d(x_range.clone(), padded_range(consumptions, true))?
            .set_secondary_coord(x_range, padded_range(temperatures, false)))
    }

    fn draw_axes<'a, 'b: 'a>(
        &self,
        chart: &mut Chart<'a, 'b>,
        labels: &[String],
        has_temperature: bool,
    ) -> Result {
        if !self.has_text {
            return Ok(());
        }
        let formatter = |x: &f64| tick_label(labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.1))
            .light_line_style(TRANSPARENT)
            .x_labels(labels.len().min(MAX_X_LABELS))
            .x_label_formatter(&formatter)
            .x_desc(self.x_description())
            .y_desc("Net Consumption (kWh)")
            .axis_desc_style((FAMILY, 18).into_font().style(FontStyle::Bold))
            .label_style((FAMILY, 14))
            .draw()?;
        if has_temperature {
            chart
                .configure_secondary_axes()
                .y_desc("Temperature (°C)")
                .axis_desc_style((FAMILY, 18).into_font().style(FontStyle::Bold).color(&ORANGE_RED))
                .label_style((FAMILY, 14).into_font().color(&ORANGE_RED))
                .draw()?;
        }
        Ok(())
    }

    fn draw_legend<'a, 'b: 'a>(&self, chart: &mut Chart<'a, 'b>) -> Result {
        if self.has_text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FAMILY, 14))
                .draw()?;
        }
        Ok(())
    }
}

/// Solid for complete periods, faded (and hatched) for incomplete ones,
/// darker for weekends and overnight hours.
fn bar_style(bucket: &Bucket) -> ShapeStyle {
    let color = if bucket.is_shaded() { DARK_STEEL_BLUE } else { STEEL_BLUE };
    let opacity = if bucket.is_complete { 0.7 } else { 0.3 };
    color.mix(opacity).filled()
}
