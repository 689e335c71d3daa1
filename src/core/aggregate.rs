use std::collections::BTreeSet;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use itertools::Itertools;

use crate::{
    core::{bucket::Bucket, granularity::Granularity, period::Period, series::Series},
    prelude::*,
    quantity::energy::KilowattHours,
};

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AggregationError {
    #[error("cannot aggregate {from} data to {to}: the target interval is finer than the source")]
    Refinement { from: Granularity, to: Granularity },
}

/// Consumption buckets at a single granularity, ordered by period.
#[derive(Clone, Debug)]
pub struct Aggregation {
    pub source: Granularity,
    pub granularity: Granularity,
    pub buckets: Vec<Bucket>,

    /// Number of incomplete months removed from the monthly aggregation.
    pub n_dropped: usize,
}

impl Aggregation {
    /// Monthly buckets spanning at least two calendar years.
    pub fn is_multi_year(&self) -> bool {
        self.granularity == Granularity::Monthly
            && self.buckets.iter().filter_map(|bucket| bucket.period.year()).unique().count() >= 2
    }

    /// Whether the buckets form the hour-of-day profile.
    pub fn is_hour_profile(&self) -> bool {
        self.granularity == Granularity::Hourly
    }
}

/// Collapse the consumption series into buckets of the target granularity.
///
/// Without a target, hourly input becomes the hour-of-day profile, and any other input is
/// partitioned by its own granularity.
#[instrument(skip_all, fields(source = %source, target = ?target))]
pub fn aggregate(
    records: &Series<NaiveDateTime, KilowattHours>,
    source: Granularity,
    target: Option<Granularity>,
) -> Result<Aggregation, AggregationError> {
    let target = match target {
        None | Some(Granularity::Hourly) if source == Granularity::Hourly => {
            return Ok(hour_profile(records));
        }
        None => source,
        Some(target) if target < source => {
            return Err(AggregationError::Refinement { from: source, to: target });
        }
        Some(target) => target,
    };

    let mut buckets = records
        .iter()
        .into_group_map_by(|(timestamp, _)| Period::of(target, *timestamp))
        .into_iter()
        .map(|(period, records)| {
            let expected_units: BTreeSet<NaiveDateTime> = period.units().into_iter().collect();
            let n_covered_units = records
                .iter()
                .flat_map(|(timestamp, _)| covered_units(source, target, *timestamp))
                .filter(|unit| expected_units.contains(unit))
                .unique()
                .count();
            Bucket {
                period,
                consumption: records.iter().map(|(_, consumption)| *consumption).sum(),
                is_complete: n_covered_units == period.n_expected_units(),
            }
        })
        .sorted_unstable_by_key(|bucket| bucket.period)
        .collect_vec();

    let mut n_dropped = 0;
    if target == Granularity::Monthly {
        let n_buckets = buckets.len();
        buckets.retain(|bucket| bucket.is_complete);
        n_dropped = n_buckets - buckets.len();
        if n_dropped != 0 {
            info!(n_dropped, "dropped incomplete months");
        }
    }

    debug!(n_buckets = buckets.len(), "aggregated");
    Ok(Aggregation { source, granularity: target, buckets, n_dropped })
}

/// Sum per hour of day. An hour is complete when every day of the series has a reading for it.
fn hour_profile(records: &Series<NaiveDateTime, KilowattHours>) -> Aggregation {
    let n_days = records.iter().map(|(timestamp, _)| timestamp.date()).unique().count();
    let buckets = records
        .iter()
        .into_group_map_by(|(timestamp, _)| timestamp.hour())
        .into_iter()
        .map(|(hour, records)| Bucket {
            period: Period::HourOfDay(hour),
            consumption: records.iter().map(|(_, consumption)| *consumption).sum(),
            is_complete: records.iter().map(|(timestamp, _)| timestamp.date()).unique().count() == n_days,
        })
        .sorted_unstable_by_key(|bucket| bucket.period)
        .collect_vec();
    Aggregation {
        source: Granularity::Hourly,
        granularity: Granularity::Hourly,
        buckets,
        n_dropped: 0,
    }
}

/// Sub-period units a single source record accounts for.
///
/// Daily buckets count hours; weekly and monthly buckets count days.
fn covered_units(
    source: Granularity,
    target: Granularity,
    timestamp: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let midnight = timestamp.date().and_time(NaiveTime::MIN);
    match (target, source) {
        (Granularity::Daily, Granularity::Hourly) => {
            vec![midnight + TimeDelta::hours(i64::from(timestamp.hour()))]
        }
        (Granularity::Daily, _) => Period::Day(timestamp.date()).units(),
        (_, Granularity::Hourly | Granularity::Daily) => vec![midnight],
        (_, _) => Period::of(source, timestamp).units(),
    }
}
