use derive_more::Display;

/// Time resolution of a consumption series, ordered from the finest to the coarsest.
#[derive(Copy, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Granularity {
    #[display("hourly")]
    Hourly,

    #[display("daily")]
    Daily,

    #[display("weekly")]
    Weekly,

    #[display("monthly")]
    Monthly,
}

impl Granularity {
    /// Infer the granularity from the textual shape of a timestamp:
    /// a time-of-day component means hourly intervals.
    pub fn detect(timestamp: &str) -> Self {
        if timestamp.trim().contains([' ', 'T']) { Self::Hourly } else { Self::Daily }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_hourly() {
        assert_eq!(Granularity::detect("2026-02-06 13:00"), Granularity::Hourly);
        assert_eq!(Granularity::detect("2026-02-06T13:00:00"), Granularity::Hourly);
    }

    #[test]
    fn test_detect_daily() {
        assert_eq!(Granularity::detect("2026-02-06"), Granularity::Daily);
        assert_eq!(Granularity::detect(" 2026-02-06 "), Granularity::Daily);
    }

    #[test]
    fn test_ordering() {
        assert!(Granularity::Hourly < Granularity::Daily);
        assert!(Granularity::Daily < Granularity::Weekly);
        assert!(Granularity::Weekly < Granularity::Monthly);
    }

    #[test]
    fn test_display() {
        assert_eq!(Granularity::Weekly.to_string(), "weekly");
    }
}
