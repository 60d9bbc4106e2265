use super::consumption::{CategoryBreakdown, DailyReading};
use super::period::ReportPeriod;
use serde::Serialize;

/// Sum, mean and extreme days over a reading sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStats {
    pub sum_kwh: f64,
    pub mean_kwh: f64,
    pub min_day: Option<DailyReading>,
    pub max_day: Option<DailyReading>,
}

/// Change of a period total against an earlier comparison period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodDelta {
    pub current_kwh: f64,
    pub previous_kwh: f64,
    pub absolute_kwh: f64,
    /// Absent when the comparison period had no consumption.
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub sensor_id: String,
    pub name: String,
    pub readings: Vec<DailyReading>,
    pub stats: DailyStats,
    pub previous_sum_kwh: f64,
    pub year_ago_sum_kwh: f64,
    /// Absent when the live endpoint failed for this sensor.
    pub live_power_w: Option<f64>,
    /// Breakdown for the last day of the period, filled to the snapshot's
    /// categories. Absent when the disaggregation endpoint failed.
    pub categories: Option<CategoryBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterRanking {
    pub sensor_id: String,
    pub name: String,
    pub sum_kwh: f64,
}

/// Aggregate over every sensor that could be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalSummary {
    pub readings: Vec<DailyReading>,
    pub stats: DailyStats,
    /// Sum over the sensors that reported live power.
    pub live_power_w: f64,
    /// Against the period immediately before.
    pub delta: PeriodDelta,
    /// Against the same ISO week one year earlier.
    pub year_ago_delta: PeriodDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorFailure {
    pub sensor_id: String,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub period: ReportPeriod,
    pub period_label: String,
    pub previous_period: Option<ReportPeriod>,
    pub year_ago_period: Option<ReportPeriod>,
    pub sensors: Vec<SensorSummary>,
    pub total: TotalSummary,
    pub highest: Option<CenterRanking>,
    pub lowest: Option<CenterRanking>,
    /// Sensors by period sum, largest first.
    pub ranking: Vec<CenterRanking>,
    pub categories: Vec<String>,
    pub failures: Vec<SensorFailure>,
}
