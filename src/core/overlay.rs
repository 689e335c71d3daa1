use average::Mean;
use chrono::NaiveDateTime;
use itertools::Itertools;

use crate::{
    core::{aggregate::Aggregation, period::Period, series::Series},
    quantity::temperature::Celsius,
};

/// Align the temperature samples onto the aggregation buckets.
///
/// Each bucket gets the mean of the samples falling into its period.
pub fn align(
    aggregation: &Aggregation,
    temperatures: &Series<NaiveDateTime, Celsius>,
) -> Vec<Option<Celsius>> {
    let by_period = temperatures
        .iter()
        .into_group_map_by(|(timestamp, _)| Period::of(aggregation.granularity, *timestamp));
    aggregation
        .buckets
        .iter()
        .map(|bucket| {
            by_period.get(&bucket.period).map(|samples| {
                let mean: Mean = samples.iter().map(|(_, temperature)| temperature.0).collect();
                Celsius(mean.mean())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::{
        core::{aggregate::aggregate, granularity::Granularity},
        prelude::*,
        quantity::energy::KilowattHours,
    };

    #[test]
    fn test_align_daily_buckets_with_hourly_samples() -> Result {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let records: Series<_, _> =
            (0..48).map(|hour| (start + TimeDelta::hours(hour), KilowattHours(1.0))).collect();
        let aggregation = aggregate(&records, Granularity::Hourly, Some(Granularity::Daily))?;

        // Only the first day has samples: 0 °C and 10 °C.
        let temperatures =
            vec![(start, Celsius(0.0)), (start + TimeDelta::hours(12), Celsius(10.0))];
        let aligned = align(&aggregation, &temperatures);
        assert_eq!(aligned.len(), 2);
        assert_abs_diff_eq!(aligned[0].unwrap().0, 5.0);
        assert!(aligned[1].is_none());
        Ok(())
    }

    #[test]
    fn test_align_hour_profile_averages_across_days() -> Result {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let records: Series<_, _> =
            (0..48).map(|hour| (start + TimeDelta::hours(hour), KilowattHours(1.0))).collect();
        let aggregation = aggregate(&records, Granularity::Hourly, None)?;
        let temperatures = (0..48)
            .map(|hour| (start + TimeDelta::hours(hour), Celsius(if hour < 24 { 2.0 } else { 4.0 })))
            .collect_vec();
        let aligned = align(&aggregation, &temperatures);
        assert_eq!(aligned.len(), 24);
        assert!(aligned.iter().all(|temperature| temperature.is_some_and(|it| (it.0 - 3.0).abs() < 1e-9)));
        Ok(())
    }
}
