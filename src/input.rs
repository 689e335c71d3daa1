pub mod discover;

use std::{fs::File, io::Read, ops::RangeInclusive, path::Path};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::{
    core::{granularity::Granularity, series::Series},
    prelude::*,
    quantity::energy::KilowattHours,
};

const TIMESTAMP_COLUMN: &str = "Interval Start Date/Time";
const CONSUMPTION_COLUMN: &str = "Net Consumption (kWh)";
const CITY_COLUMN: &str = "City";
const ADDRESS_COLUMN: &str = "Service Address";

const REQUIRED_COLUMNS: [&str; 4] =
    [TIMESTAMP_COLUMN, CONSUMPTION_COLUMN, CITY_COLUMN, ADDRESS_COLUMN];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open `{path}`")]
    Open {
        path: String,

        #[source]
        source: std::io::Error,
    },

    #[error("failed to read the CSV")]
    Csv(#[from] csv::Error),

    #[error("schema mismatch: missing required column(s) {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("the file contains no data rows")]
    NoData,

    #[error("row {row}: invalid timestamp `{value}`")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: invalid consumption `{value}`")]
    InvalidConsumption { row: usize, value: String },
}

/// Raw CSV row, converted into typed values after deserialization.
#[derive(Deserialize)]
struct Row {
    #[serde(rename = "Interval Start Date/Time")]
    timestamp: String,

    #[serde(rename = "Net Consumption (kWh)")]
    consumption: String,

    #[serde(rename = "City")]
    city: Option<String>,

    #[serde(rename = "Service Address")]
    address: Option<String>,
}

/// Location the meter belongs to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Site {
    pub city: Option<String>,
    pub address: Option<String>,
}

impl std::fmt::Display for Site {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.address, &self.city) {
            (Some(address), Some(city)) => write!(formatter, "{address}, {city}"),
            (Some(single), None) | (None, Some(single)) => write!(formatter, "{single}"),
            (None, None) => write!(formatter, "unknown site"),
        }
    }
}

/// Meter readings loaded from a BC Hydro consumption export.
#[derive(Clone, Debug)]
pub struct MeterReadings {
    pub site: Site,

    /// Detected from the first row.
    pub granularity: Granularity,

    /// Sorted by timestamp.
    pub records: Series<NaiveDateTime, KilowattHours>,

    /// First and last date covered by the records.
    pub dates: RangeInclusive<NaiveDate>,
}

impl MeterReadings {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)
            .map_err(|source| LoadError::Open { path: path.display().to_string(), source })?;
        let this = Self::from_reader(file)?;
        info!(
            n_records = this.records.len(),
            granularity = %this.granularity,
            since = %this.dates.start(),
            until = %this.dates.end(),
            "loaded",
        );
        Ok(this)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|header| header == **column))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::SchemaMismatch { missing });
        }

        let mut site = Site::default();
        let mut granularity = None;
        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<Row>().enumerate() {
            let row = row?;
            let n_row = index + 1;

            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                LoadError::InvalidTimestamp { row: n_row, value: row.timestamp.clone() }
            })?;
            let consumption = row
                .consumption
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| LoadError::InvalidConsumption {
                    row: n_row,
                    value: row.consumption.clone(),
                })?;

            granularity.get_or_insert_with(|| Granularity::detect(&row.timestamp));
            if site.city.is_none() {
                site.city = row.city.filter(|city| !city.is_empty());
            }
            if site.address.is_none() {
                site.address = row.address.filter(|address| !address.is_empty());
            }
            records.push((timestamp, KilowattHours(consumption)));
        }

        let granularity = granularity.ok_or(LoadError::NoData)?;
        records.sort_by_key(|(timestamp, _)| *timestamp);
        let (Some((first, _)), Some((last, _))) = (records.first(), records.last()) else {
            return Err(LoadError::NoData);
        };
        let dates = first.date()..=last.date();
        Ok(Self { site, granularity, records, dates })
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|date| date.and_time(NaiveTime::MIN))
        })
}
