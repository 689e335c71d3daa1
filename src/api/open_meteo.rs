//! [Open-Meteo](https://open-meteo.com/en/docs/historical-weather-api) historical weather client.

use std::{ops::RangeInclusive, time::Duration};

use bon::bon;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use ureq::Agent;

use crate::{core::series::Series, prelude::*, quantity::temperature::Celsius};

pub const DEFAULT_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Resolution {
    #[display("hourly")]
    Hourly,

    #[display("daily")]
    Daily,
}

impl Resolution {
    /// Name of the requested temperature variable.
    const fn variable(self) -> &'static str {
        match self {
            Self::Hourly => "temperature_2m",
            Self::Daily => "temperature_2m_mean",
        }
    }
}

pub struct Api {
    client: Agent,
    url: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
}

#[bon]
impl Api {
    #[builder]
    pub fn new(
        #[builder(into)] url: String,
        latitude: f64,
        longitude: f64,
        #[builder(into)] timezone: String,
        timeout: Duration,
    ) -> Self {
        let client = Agent::config_builder().timeout_global(Some(timeout)).build().into();
        Self { client, url, latitude, longitude, timezone }
    }
}

impl Api {
    /// Fetch the temperatures for the inclusive date range.
    ///
    /// Missing samples are skipped.
    #[instrument(skip_all, fields(resolution = %resolution, since = %dates.start(), until = %dates.end()))]
    pub fn get(
        &self,
        resolution: Resolution,
        dates: &RangeInclusive<NaiveDate>,
    ) -> Result<Series<NaiveDateTime, Celsius>> {
        info!("fetching…");
        let response = self
            .client
            .get(&self.url)
            .query("latitude", self.latitude.to_string())
            .query("longitude", self.longitude.to_string())
            .query("start_date", dates.start().to_string())
            .query("end_date", dates.end().to_string())
            .query(resolution.to_string(), resolution.variable())
            .query("timezone", &self.timezone)
            .call()
            .context("failed to call the weather API")?
            .body_mut()
            .read_json::<Response>()
            .context("failed to deserialize the weather response")?;
        let series = response.into_series(resolution)?;
        info!(n_samples = series.len(), "fetched");
        Ok(series)
    }
}

#[derive(Deserialize)]
struct Response {
    hourly: Option<Samples>,
    daily: Option<Samples>,
}

impl Response {
    fn into_series(self, resolution: Resolution) -> Result<Series<NaiveDateTime, Celsius>> {
        let samples = match resolution {
            Resolution::Hourly => self.hourly,
            Resolution::Daily => self.daily,
        }
        .with_context(|| format!("the response contains no {resolution} samples"))?;
        ensure!(
            samples.time.len() == samples.temperature.len(),
            "got {} timestamps but {} temperatures",
            samples.time.len(),
            samples.temperature.len(),
        );
        samples
            .time
            .iter()
            .zip(samples.temperature)
            .filter_map(|(time, temperature)| temperature.map(|temperature| (time, temperature)))
            .map(|(time, temperature)| Ok((parse_time(time)?, Celsius(temperature))))
            .collect()
    }
}

#[derive(Deserialize)]
struct Samples {
    time: Vec<String>,

    #[serde(rename = "temperature_2m", alias = "temperature_2m_mean")]
    temperature: Vec<Option<f64>>,
}

fn parse_time(time: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .or_else(|_| {
            NaiveDate::parse_from_str(time, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        })
        .with_context(|| format!("invalid sample time `{time}`"))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_parse_hourly() -> Result {
        let response: Response = serde_json::from_str(
            r#"{
                "latitude": 49.78,
                "longitude": -123.13,
                "hourly_units": {"time": "iso8601", "temperature_2m": "°C"},
                "hourly": {
                    "time": ["2026-02-06T00:00", "2026-02-06T01:00", "2026-02-06T02:00"],
                    "temperature_2m": [1.5, null, 0.5]
                }
            }"#,
        )?;
        let series = response.into_series(Resolution::Hourly)?;
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].0.format("%H:%M").to_string(), "02:00");
        assert_abs_diff_eq!(series[1].1.0, 0.5);
        Ok(())
    }

    #[test]
    fn test_parse_daily() -> Result {
        let response: Response = serde_json::from_str(
            r#"{"daily": {"time": ["2026-02-06", "2026-02-07"], "temperature_2m_mean": [-2.25, 3.0]}}"#,
        )?;
        let series = response.into_series(Resolution::Daily)?;
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0.date(), NaiveDate::from_ymd_opt(2026, 2, 6).unwrap());
        assert_abs_diff_eq!(series[0].1.0, -2.25);
        Ok(())
    }

    #[test]
    fn test_missing_resolution() -> Result {
        let response: Response = serde_json::from_str(r#"{"daily": {"time": [], "temperature_2m_mean": []}}"#)?;
        assert!(response.into_series(Resolution::Hourly).is_err());
        Ok(())
    }

    #[test]
    fn test_length_mismatch() -> Result {
        let response: Response =
            serde_json::from_str(r#"{"daily": {"time": ["2026-02-06"], "temperature_2m_mean": []}}"#)?;
        assert!(response.into_series(Resolution::Daily).is_err());
        Ok(())
    }

    #[test]
    #[ignore = "makes the API request"]
    fn test_get_ok() -> Result {
        let api = Api::builder()
            .url(DEFAULT_URL)
            .latitude(49.7833)
            .longitude(-123.1333)
            .timezone("America/Vancouver")
            .timeout(Duration::from_secs(30))
            .build();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let series = api.get(Resolution::Daily, &(date..=date))?;
        assert_eq!(series.len(), 1);
        Ok(())
    }
}
