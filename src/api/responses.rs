//! Wire shapes of the reseller data endpoints. Only the fields the dashboards use are modelled.

use crate::models::{CategoryBreakdown, DailyReading, LivePower};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// `GET /sensors/{id}/disag/day`
#[derive(Debug, Deserialize)]
pub struct DisaggregationResponse {
    #[serde(default)]
    pub consumption: CategoryBreakdown,
}

/// `GET /sensors/{id}/stats/live`
#[derive(Debug, Deserialize)]
pub struct LivePowerResponse {
    #[serde(default)]
    pub consumption: LiveConsumption,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveConsumption {
    #[serde(rename = "actualRaw", default)]
    pub actual_raw: Option<f64>,
}

impl From<LivePowerResponse> for LivePower {
    fn from(response: LivePowerResponse) -> Self {
        LivePower {
            actual_raw_w: response.consumption.actual_raw.unwrap_or(0.0),
        }
    }
}

/// `GET /sensors/{id}/stats/consumption`
#[derive(Debug, Deserialize)]
pub struct ConsumptionResponse {
    #[serde(rename = "dailyMetrics", default)]
    pub daily_metrics: Vec<DailyMetric>,
}

#[derive(Debug, Deserialize)]
pub struct DailyMetric {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub consumption: Option<f64>,
}

impl From<DailyMetric> for DailyReading {
    fn from(metric: DailyMetric) -> Self {
        DailyReading::new(metric.date, metric.consumption.unwrap_or(0.0))
    }
}

impl ConsumptionResponse {
    pub fn into_readings(self) -> Vec<DailyReading> {
        self.daily_metrics.into_iter().map(DailyReading::from).collect()
    }
}

/// Accepts `2025-05-04` as well as a full RFC 3339 timestamp.
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
