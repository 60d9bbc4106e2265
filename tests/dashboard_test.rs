// End-to-end tests: session + API client + dashboard service against a
// scripted in-memory transport standing in for the reseller API.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use kundencenter::auth::{AuthEndpoints, Credential, ManualClock, Session, TokenManager, TokenStatus};
use kundencenter::config::SensorConfig;
use kundencenter::error::TransportError;
use kundencenter::http::{HttpRequest, HttpResponse, HttpTransport, Method};
use kundencenter::models::ReportPeriod;
use kundencenter::{ApiClient, DashboardService};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

const AUTH_BASE: &str = "https://auth.example.test";
const DATA_BASE: &str = "https://data.example.test";

/// Routes requests by path and records every request it sees.
#[derive(Clone, Default)]
struct ScriptedTransport {
    log: Arc<Mutex<Vec<HttpRequest>>>,
    refreshes: Arc<Mutex<u32>>,
}

impl ScriptedTransport {
    fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }

    fn query<'a>(request: &'a HttpRequest, key: &str) -> &'a str {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    fn daily_metrics(sensor_id: &str, request: &HttpRequest) -> HttpResponse {
        let start = NaiveDate::parse_from_str(Self::query(request, "start"), "%Y-%m-%d").unwrap();
        let end = NaiveDate::parse_from_str(Self::query(request, "end"), "%Y-%m-%d").unwrap();
        let per_day = match sensor_id {
            "21820" => 10.0,
            _ => 4.0,
        };

        let metrics: Vec<serde_json::Value> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| serde_json::json!({"date": d.format("%Y-%m-%d").to_string(), "consumption": per_day}))
            .collect();

        HttpResponse::new(200, serde_json::json!({ "dailyMetrics": metrics }).to_string())
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());

        if request.url == format!("{}/auth/token", AUTH_BASE) {
            return Ok(HttpResponse::new(
                200,
                r#"{"access_token":"access-0","refresh_token":"refresh-0","expires_in_secs":3600}"#,
            ));
        }
        if request.url == format!("{}/auth/token/refresh", AUTH_BASE) {
            let mut refreshes = self.refreshes.lock().unwrap();
            *refreshes += 1;
            // no refresh_token in the refresh response
            let body = format!(
                r#"{{"access_token":"access-{}","expires_in_secs":3600}}"#,
                *refreshes
            );
            return Ok(HttpResponse::new(200, body));
        }

        let path = request
            .url
            .strip_prefix(&format!("{}/sensors/", DATA_BASE))
            .ok_or_else(|| TransportError(format!("unexpected url {}", request.url)))?;
        let (sensor_id, endpoint) = path.split_once('/').unwrap();

        if sensor_id == "99999" {
            return Ok(HttpResponse::new(404, "sensor not found"));
        }

        let response = match endpoint {
            "stats/consumption" => Self::daily_metrics(sensor_id, &request),
            "stats/live" => HttpResponse::new(
                200,
                if sensor_id == "21820" {
                    r#"{"consumption":{"actualRaw":1500}}"#
                } else {
                    r#"{"consumption":{"actualRaw":500}}"#
                },
            ),
            "disag/day" => HttpResponse::new(
                200,
                if sensor_id == "21820" {
                    r#"{"consumption":{"Standby":3.0,"Kitchen":5.0}}"#
                } else {
                    r#"{"consumption":{"Air conditioning":2.0,"Standby":1.0}}"#
                },
            ),
            other => return Err(TransportError(format!("unknown endpoint {}", other))),
        };
        Ok(response)
    }
}

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 25, 7, 0, 0).unwrap()
}

fn client(
    transport: &ScriptedTransport,
    clock: &ManualClock,
) -> ApiClient<ScriptedTransport, ManualClock> {
    let session = Session::new(TokenManager::with_clock(
        Credential::new("client", "secret"),
        AuthEndpoints::from_base(AUTH_BASE),
        transport.clone(),
        clock.clone(),
    ));
    session.authenticate().unwrap();
    ApiClient::new(session, DATA_BASE)
}

fn sensor(id: &str, name: &str) -> SensorConfig {
    SensorConfig {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn period() -> ReportPeriod {
    ReportPeriod::last_days(NaiveDate::from_ymd_opt(2024, 3, 24).unwrap(), 7).unwrap()
}

#[test]
fn test_snapshot_over_authenticated_client() {
    let transport = ScriptedTransport::default();
    let clock = ManualClock::new(start());
    let service = DashboardService::new(
        client(&transport, &clock),
        vec![sensor("21820", "Mattersburg"), sensor("21189", "Eisenstadt")],
        None,
    );

    let snapshot = service.build_snapshot(period());

    assert_eq!(snapshot.period_label, "(KW12) 18.03.2024 - 24.03.2024");
    assert!(snapshot.failures.is_empty());
    assert_eq!(snapshot.sensors[0].stats.sum_kwh, 70.0);
    assert_eq!(snapshot.sensors[1].stats.sum_kwh, 28.0);
    assert_eq!(snapshot.total.readings.len(), 7);
    assert_eq!(snapshot.total.stats.sum_kwh, 98.0);
    assert_eq!(snapshot.total.stats.mean_kwh, 14.0);
    assert_eq!(snapshot.total.live_power_w, 2000.0);
    // flat consumption: no change against the previous week or last year
    assert_eq!(snapshot.total.delta.percent, Some(0.0));
    assert_eq!(snapshot.total.year_ago_delta.previous_kwh, 98.0);
    assert_eq!(snapshot.total.year_ago_delta.percent, Some(0.0));
    assert_eq!(snapshot.highest.as_ref().unwrap().name, "Mattersburg");
    assert_eq!(snapshot.lowest.as_ref().unwrap().name, "Eisenstadt");
    assert_eq!(
        snapshot.categories,
        vec!["Kitchen", "Standby", "Air conditioning"]
    );
    assert_eq!(
        snapshot.sensors[1]
            .categories
            .as_ref()
            .unwrap()
            .iter()
            .collect::<Vec<_>>(),
        vec![("Kitchen", 0.0), ("Standby", 1.0), ("Air conditioning", 2.0)]
    );

    // one grant, no refresh, every data call carried the bearer token
    assert_eq!(transport.count("/auth/token"), 1);
    assert_eq!(transport.count("/auth/token/refresh"), 0);
    let data_calls: Vec<HttpRequest> = transport
        .requests()
        .into_iter()
        .filter(|r| r.url.starts_with(DATA_BASE))
        .collect();
    // usage for the period, the week before and last year, then live and disag
    assert_eq!(data_calls.len(), 10);
    for request in &data_calls {
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.header_value("Authorization"), Some("Bearer access-0"));
    }
}

#[test]
fn test_expired_token_is_refreshed_exactly_once() {
    let transport = ScriptedTransport::default();
    let clock = ManualClock::new(start());
    let client = client(&transport, &clock);
    let day = NaiveDate::from_ymd_opt(2024, 3, 24).unwrap();

    clock.advance(Duration::seconds(3601));
    assert_eq!(client.session().status(), TokenStatus::Expired);

    client.live_power("21820").unwrap();
    client.disaggregation("21820", day).unwrap();
    client.usage_per_day("21820", day, day).unwrap();

    assert_eq!(transport.count("/auth/token/refresh"), 1);
    assert_eq!(client.session().status(), TokenStatus::Valid);

    let state = client.session().token_state().unwrap();
    assert_eq!(state.access_token, "access-1");
    assert_eq!(state.refresh_token.as_deref(), Some("refresh-0"));

    let refresh = transport
        .requests()
        .into_iter()
        .find(|r| r.url.ends_with("/auth/token/refresh"))
        .unwrap();
    assert_eq!(
        refresh.body,
        Some(serde_json::json!({
            "grant_type": "refresh_token",
            "client_id": "client",
            "refresh_token": "refresh-0",
        }))
    );
}

#[test]
fn test_unknown_sensor_reported_as_failure() {
    let transport = ScriptedTransport::default();
    let clock = ManualClock::new(start());
    let service = DashboardService::new(
        client(&transport, &clock),
        vec![sensor("99999", "Nowhere"), sensor("21189", "Eisenstadt")],
        Some(1),
    );

    let snapshot = service.build_snapshot(period());

    assert_eq!(snapshot.failures.len(), 1);
    assert_eq!(snapshot.failures[0].name, "Nowhere");
    assert!(snapshot.failures[0].error.contains("404"));
    assert_eq!(snapshot.sensors.len(), 1);
    assert_eq!(snapshot.categories, vec!["Air conditioning"]);
    assert_eq!(snapshot.ranking.len(), 1);
}

#[test]
fn test_snapshot_serializes_for_dashboard() {
    let transport = ScriptedTransport::default();
    let clock = ManualClock::new(start());
    let service = DashboardService::new(
        client(&transport, &clock),
        vec![sensor("21820", "Mattersburg")],
        None,
    );

    let json = serde_json::to_value(service.build_snapshot(period())).unwrap();

    assert_eq!(json["period"]["start"], "2024-03-18");
    assert_eq!(json["sensors"][0]["stats"]["max_day"]["date"], "2024-03-18");
    assert_eq!(json["sensors"][0]["categories"]["Kitchen"], 5.0);
    assert_eq!(json["total"]["live_power_w"], 1500.0);
}
