pub mod aggregate;
pub mod bucket;
pub mod granularity;
pub mod overlay;
pub mod period;
pub mod series;
