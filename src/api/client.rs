use super::responses::{ConsumptionResponse, DisaggregationResponse, LivePowerResponse};
use super::ConsumptionSource;
use crate::auth::{Clock, Session, SystemClock};
use crate::error::{RequestError, Result};
use crate::http::{HttpRequest, HttpTransport};
use crate::models::{CategoryBreakdown, DailyReading, LivePower};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::debug;

pub const DEFAULT_DATA_BASE_URL: &str = "https://reseller-api.voltaware.com";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed access to the per-sensor data endpoints through an authenticated session.
pub struct ApiClient<T, C = SystemClock> {
    session: Session<T, C>,
    base_url: String,
}

impl<T: HttpTransport, C: Clock> ApiClient<T, C> {
    pub fn new(session: Session<T, C>, base_url: &str) -> Self {
        Self {
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn session(&self) -> &Session<T, C> {
        &self.session
    }

    /// Disaggregated consumption of one sensor for one day.
    pub fn disaggregation(&self, sensor_id: &str, date: NaiveDate) -> Result<CategoryBreakdown> {
        let request = HttpRequest::get(self.sensor_url(sensor_id, "disag/day"))
            .query("date", date.format(DATE_FORMAT).to_string());
        let response: DisaggregationResponse = self.get_json(request)?;
        Ok(response.consumption)
    }

    pub fn live_power(&self, sensor_id: &str) -> Result<LivePower> {
        let request = HttpRequest::get(self.sensor_url(sensor_id, "stats/live"));
        let response: LivePowerResponse = self.get_json(request)?;
        Ok(response.into())
    }

    /// Daily consumption between `start` and `end`, as reported in `dailyMetrics`.
    pub fn usage_per_day(
        &self,
        sensor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>> {
        let request = HttpRequest::get(self.sensor_url(sensor_id, "stats/consumption"))
            .query("start", start.format(DATE_FORMAT).to_string())
            .query("end", end.format(DATE_FORMAT).to_string());
        let response: ConsumptionResponse = self.get_json(request)?;
        Ok(response.into_readings())
    }

    fn sensor_url(&self, sensor_id: &str, endpoint: &str) -> String {
        format!("{}/sensors/{}/{}", self.base_url, sensor_id, endpoint)
    }

    fn get_json<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R> {
        debug!(url = %request.url, "GET");
        let response = self.session.authorized_request(request)?;
        response
            .json()
            .map_err(|e| RequestError::Decode(e.to_string()).into())
    }
}

impl<T: HttpTransport, C: Clock> ConsumptionSource for ApiClient<T, C> {
    fn usage_per_day(
        &self,
        sensor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>> {
        ApiClient::usage_per_day(self, sensor_id, start, end)
    }

    fn live_power(&self, sensor_id: &str) -> Result<LivePower> {
        ApiClient::live_power(self, sensor_id)
    }

    fn disaggregation(&self, sensor_id: &str, date: NaiveDate) -> Result<CategoryBreakdown> {
        ApiClient::disaggregation(self, sensor_id, date)
    }
}
