use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;

use crate::{
    api::Resolution,
    chart::{CorrelationChart, font},
    cli::{ChartArgs, DirectoryArgs, DisplayArgs, WeatherArgs},
    core::{aggregate::aggregate, granularity::Granularity, overlay::align, period::Period},
    display,
    input::{MeterReadings, discover::find_csv_file},
    prelude::*,
    statistics::{Correlation, Observation, ensure_sufficient, ranges::summarize},
    tables::build_ranges_table,
};

const RULER: &str = "============================================================";

#[derive(Parser)]
pub struct CorrelateArgs {
    /// Path to the BC Hydro consumption CSV file, covering at least three months.
    #[clap(value_name = "CSV_FILE")]
    pub file: PathBuf,

    #[clap(flatten)]
    pub display: DisplayArgs,

    #[clap(flatten)]
    pub directories: DirectoryArgs,

    #[clap(flatten)]
    pub weather: WeatherArgs,

    #[clap(flatten)]
    pub chart: ChartArgs,
}

#[instrument(skip_all)]
pub fn correlate(args: &CorrelateArgs) -> Result {
    let path = find_csv_file(Some(args.file.as_path()), &args.directories.input_dir)?;
    println!("Processing file: {}", path.display());

    let readings = MeterReadings::read_from(&path)?;
    println!("Detected interval type: {}", readings.granularity);
    let aggregation = aggregate(&readings.records, readings.granularity, Some(Granularity::Daily))?;

    // Fail before hitting the network when the days are not there anyway.
    ensure_sufficient(aggregation.buckets.iter().filter(|bucket| bucket.is_complete).count())?;

    let temperatures = align(
        &aggregation,
        &args
            .weather
            .api()
            .get(Resolution::Daily, &readings.dates)
            .context("failed to fetch the daily temperatures")?,
    );
    let observations = aggregation
        .buckets
        .iter()
        .zip(temperatures)
        .filter(|(bucket, _)| bucket.is_complete)
        .filter_map(|(bucket, temperature)| match bucket.period {
            Period::Day(date) => Some(Observation {
                date,
                temperature: temperature?,
                consumption: bucket.consumption,
            }),
            _ => None,
        })
        .collect_vec();
    ensure_sufficient(observations.len())?;

    let correlation = Correlation::try_estimate(&observations)?;
    println!("Analyzing {} data points\n", correlation.n_points);
    println!("{correlation}");

    let output_path = args.directories.output_path(&path, "_correlation", "png")?;
    CorrelationChart::builder()
        .observations(&observations)
        .correlation(&correlation)
        .has_text(font::try_register(args.chart.font.as_deref()))
        .build()
        .render(&output_path)?;
    println!("\nAnalysis graph saved as: {}", output_path.display());

    if args.display.is_enabled() {
        display::open(&output_path);
    }

    println!("\n{RULER}\nCONSUMPTION BY TEMPERATURE RANGE\n{RULER}");
    println!("{}", build_ranges_table(&summarize(&observations)));
    println!("\n{RULER}\nINTERPRETATION\n{RULER}");
    println!("{}", correlation.interpretation());
    Ok(())
}
