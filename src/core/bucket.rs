use crate::{core::period::Period, quantity::energy::KilowattHours};

/// Aggregated consumption over one period.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bucket {
    pub period: Period,
    pub consumption: KilowattHours,

    /// Whether every expected sub-period is present.
    pub is_complete: bool,
}

impl Bucket {
    pub fn is_weekend(&self) -> bool {
        self.period.is_weekend()
    }

    pub const fn is_overnight(&self) -> bool {
        self.period.is_overnight()
    }

    /// Drawn in the darker shade.
    pub fn is_shaded(&self) -> bool {
        self.is_weekend() || self.is_overnight()
    }
}
