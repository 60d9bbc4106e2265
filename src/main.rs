use anyhow::Context;
use chrono::Utc;
use kundencenter::{
    auth::{Session, TokenManager},
    config::Config,
    http::ReqwestTransport,
    models::ReportPeriod,
    ApiClient, DashboardService,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Starting kundencenter");

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(path = %cfg_path, sensors = cfg.sensors.len(), "Configuration loaded");

    let transport = ReqwestTransport::new(Some(cfg.api.timeout()))?;
    let manager = TokenManager::new(
        cfg.credentials.credential(),
        cfg.api.auth_endpoints(),
        transport,
    );
    let session = Session::new(manager);
    session
        .authenticate()
        .context("authenticating against the reseller API")?;

    let client = ApiClient::new(session, &cfg.api.data_base_url);
    let service = DashboardService::new(client, cfg.sensors.clone(), cfg.report.top_categories);

    // Today's numbers are incomplete; the report always ends yesterday.
    let yesterday = Utc::now()
        .date_naive()
        .pred_opt()
        .context("date out of range")?;
    let period = ReportPeriod::last_days(yesterday, cfg.report.days)
        .context("report period starts before the earliest supported date")?;
    let snapshot = service.build_snapshot(period);

    for failure in &snapshot.failures {
        warn!(sensor_id = %failure.sensor_id, name = %failure.name, error = %failure.error, "Sensor missing from snapshot");
    }
    anyhow::ensure!(
        !snapshot.sensors.is_empty(),
        "no sensor data could be fetched ({} failures)",
        snapshot.failures.len()
    );

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    info!("Snapshot complete");
    Ok(())
}
