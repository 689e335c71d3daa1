use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};

use crate::core::granularity::Granularity;

/// Identifier of an aggregated time period.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Period {
    /// Hour of day, `0..24`, across all days of a series.
    HourOfDay(u32),

    Day(NaiveDate),

    /// Week starting on the specified Monday.
    Week(NaiveDate),

    Month { year: i32, month: u32 },
}

impl Period {
    /// Period of the given granularity that contains the timestamp.
    ///
    /// Hourly granularity maps onto the hour of day.
    pub fn of(granularity: Granularity, timestamp: NaiveDateTime) -> Self {
        let date = timestamp.date();
        match granularity {
            Granularity::Hourly => Self::HourOfDay(timestamp.hour()),
            Granularity::Daily => Self::Day(date),
            Granularity::Weekly => Self::Week(date.week(Weekday::Mon).first_day()),
            Granularity::Monthly => Self::Month { year: date.year(), month: date.month() },
        }
    }

    /// Number of sub-periods in a complete period: hours in a day, days in a week or month.
    pub fn n_expected_units(self) -> usize {
        match self {
            Self::HourOfDay(_) => 1,
            Self::Day(_) => 24,
            Self::Week(_) => 7,
            Self::Month { year, month } => days_in_month(year, month) as usize,
        }
    }

    /// Sub-period units covered by this period: the hours of a day, or the days of a week or month.
    pub fn units(self) -> Vec<NaiveDateTime> {
        match self {
            Self::HourOfDay(_) => Vec::new(),
            Self::Day(date) => {
                let midnight = date.and_time(NaiveTime::MIN);
                (0..24).map(|hour| midnight + TimeDelta::hours(hour)).collect()
            }
            Self::Week(monday) => (0..7)
                .map(|day| (monday + TimeDelta::days(day)).and_time(NaiveTime::MIN))
                .collect(),
            Self::Month { year, month } => (1..=days_in_month(year, month))
                .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
                .map(|date| date.and_time(NaiveTime::MIN))
                .collect(),
        }
    }

    pub fn year(self) -> Option<i32> {
        match self {
            Self::HourOfDay(_) => None,
            Self::Day(date) | Self::Week(date) => Some(date.year()),
            Self::Month { year, .. } => Some(year),
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Self::Day(date) if matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
    }

    /// Night hours: 22:00 to 06:00.
    pub const fn is_overnight(self) -> bool {
        matches!(self, Self::HourOfDay(hour) if hour >= 22 || hour < 6)
    }

    /// Full label, as used in the exported text data.
    pub fn label(self) -> String {
        match self {
            Self::HourOfDay(hour) => format!("{hour:02}:00"),
            Self::Day(date) | Self::Week(date) => date.format("%Y-%m-%d").to_string(),
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
        }
    }

    /// Compact label for chart ticks.
    pub fn tick_label(self) -> String {
        match self {
            Self::HourOfDay(hour) => hour.to_string(),
            Self::Day(date) | Self::Week(date) => date.format("%b %d").to_string(),
            Self::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map_or_else(|| format!("{year}-{month:02}"), |date| date.format("%b %Y").to_string()),
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next_month| first_of_next_month.pred_opt())
        .map_or(31, |last_day| last_day.day())
}
