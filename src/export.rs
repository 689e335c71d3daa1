use std::{fs::File, io::Write, path::Path};

use crate::{core::aggregate::Aggregation, prelude::*, quantity::temperature::Celsius};

const HEADER: [&str; 3] = ["Date/Time", "Net Consumption (kWh)", "Temperature (°C)"];

/// Write the buckets as tab-separated text.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_text(
    path: &Path,
    aggregation: &Aggregation,
    temperatures: Option<&[Option<Celsius>]>,
) -> Result {
    let file =
        File::create(path).with_context(|| format!("failed to create `{}`", path.display()))?;
    write_to(file, aggregation, temperatures)
        .with_context(|| format!("failed to write `{}`", path.display()))
}

pub fn write_to(
    writer: impl Write,
    aggregation: &Aggregation,
    temperatures: Option<&[Option<Celsius>]>,
) -> Result {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    writer.write_record(HEADER)?;
    for (index, bucket) in aggregation.buckets.iter().enumerate() {
        let temperature = temperatures
            .and_then(|temperatures| temperatures.get(index).copied().flatten())
            .map(|temperature| format!("{:.1}", temperature.0))
            .unwrap_or_default();
        writer.write_record([
            bucket.period.label(),
            format!("{:.2}", bucket.consumption.0),
            temperature,
        ])?;
    }
    writer.flush()?;
    Ok(())
}
