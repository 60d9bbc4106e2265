pub mod client;
pub mod responses;

pub use client::{ApiClient, DEFAULT_DATA_BASE_URL};

use crate::error::Result;
use crate::models::{CategoryBreakdown, DailyReading, LivePower};
use chrono::NaiveDate;

/// Where the dashboard service gets its per-sensor data from.
#[cfg_attr(test, mockall::automock)]
pub trait ConsumptionSource {
    fn usage_per_day(
        &self,
        sensor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>>;

    fn live_power(&self, sensor_id: &str) -> Result<LivePower>;

    fn disaggregation(&self, sensor_id: &str, date: NaiveDate) -> Result<CategoryBreakdown>;
}
