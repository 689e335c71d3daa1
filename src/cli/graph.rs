use std::{ops::RangeInclusive, path::PathBuf};

use chrono::NaiveDate;
use clap::Parser;

use crate::{
    api::{OpenMeteo, Resolution},
    chart::{ConsumptionChart, font},
    cli::{AggregationArgs, ChartArgs, DirectoryArgs, DisplayArgs, WeatherArgs},
    core::{
        aggregate::{Aggregation, aggregate},
        granularity::Granularity,
        overlay::align,
    },
    display,
    export,
    input::{MeterReadings, discover::find_csv_file},
    prelude::*,
    quantity::temperature::Celsius,
};

#[derive(Parser)]
pub struct GraphArgs {
    /// Path to a specific BC Hydro consumption CSV file
    /// (optional if only one matching file exists in the input directory).
    #[clap(value_name = "CSV_FILE")]
    pub file: Option<PathBuf>,

    #[clap(flatten)]
    pub aggregation: AggregationArgs,

    /// Also save the plotted data as tab-separated text.
    #[clap(long)]
    pub text: bool,

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
pub fn graph(args: &GraphArgs) -> Result {
    let path = find_csv_file(args.file.as_deref(), &args.directories.input_dir)?;
    println!("Processing file: {}", path.display());

    let readings = MeterReadings::read_from(&path)?;
    println!("Detected interval type: {}", readings.granularity);

    let target = args.aggregation.target();
    let aggregation = aggregate(&readings.records, readings.granularity, target)?;
    if target.is_some() {
        println!("Aggregating {} data to {}", aggregation.source, aggregation.granularity);
    }
    ensure!(!aggregation.buckets.is_empty(), "no complete {} periods to plot", aggregation.granularity);
    if aggregation.n_dropped != 0 {
        println!("Dropped {} incomplete month(s)", aggregation.n_dropped);
    }

    let temperatures = fetch_temperatures(&args.weather.api(), &aggregation, &readings.dates);
    if temperatures.is_none() {
        println!("Warning: Could not fetch weather data, proceeding without temperature overlay");
    }

    let output_path = args.directories.output_path(&path, "", "png")?;
    ConsumptionChart::builder()
        .aggregation(&aggregation)
        .maybe_temperatures(temperatures.as_deref())
        .site(&readings.site)
        .dates(&readings.dates)
        .has_text(font::try_register(args.chart.font.as_deref()))
        .build()
        .render(&output_path)?;

    if args.text {
        let text_path = args.directories.output_path(&path, "", "txt")?;
        export::write_text(&text_path, &aggregation, temperatures.as_deref())?;
        println!("Text data saved as: {}", text_path.display());
    }

    println!("\nGraph saved as: {}", output_path.display());
    println!("Graph generation complete!");

    if args.display.is_enabled() {
        display::open(&output_path);
    }
    Ok(())
}

/// Temperatures aligned with the buckets, or `None` when the weather is unavailable.
fn fetch_temperatures(
    api: &OpenMeteo,
    aggregation: &Aggregation,
    dates: &RangeInclusive<NaiveDate>,
) -> Option<Vec<Option<Celsius>>> {
    let resolution = if aggregation.granularity == Granularity::Hourly {
        Resolution::Hourly
    } else {
        Resolution::Daily
    };
    match api.get(resolution, dates) {
        Ok(series) => {
            let temperatures = align(aggregation, &series);
            if temperatures.iter().all(Option::is_none) {
                warn!("no temperatures match the consumption periods");
                None
            } else {
                Some(temperatures)
            }
        }
        Err(error) => {
            warn!("failed to fetch the weather data: {error:#}");
            None
        }
    }
}
