use crate::api::DEFAULT_DATA_BASE_URL;
use crate::auth::{AuthEndpoints, Credential, DEFAULT_AUTH_BASE_URL};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CLIENT_ID_ENV: &str = "KUNDENCENTER_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "KUNDENCENTER_CLIENT_SECRET";
pub const MAX_REPORT_DAYS: u32 = 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub sensors: Vec<SensorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_auth_base_url() -> String {
    DEFAULT_AUTH_BASE_URL.into()
}

fn default_data_base_url() -> String {
    DEFAULT_DATA_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_base_url: default_auth_base_url(),
            data_base_url: default_data_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn auth_endpoints(&self) -> AuthEndpoints {
        AuthEndpoints::from_base(&self.auth_base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialsConfig {
    pub fn credential(&self) -> Credential {
        Credential::new(&self.client_id, &self.client_secret)
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of days in the report period, ending yesterday.
    #[serde(default = "default_report_days")]
    pub days: u32,
    /// Keep only the N largest categories in the disaggregation breakdowns.
    #[serde(default)]
    pub top_categories: Option<usize>,
}

fn default_report_days() -> u32 {
    7
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            days: default_report_days(),
            top_categories: None,
        }
    }
}

/// One customer center and the sensor metering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    pub name: String,
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    /// Afterwards the client id/secret env vars override the file values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut cfg = Self::parse(&raw)?;

        if let Ok(client_id) = std::env::var(CLIENT_ID_ENV) {
            cfg.credentials.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var(CLIENT_SECRET_ENV) {
            cfg.credentials.client_secret = client_secret;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Expand placeholders and parse, without env overrides or validation.
    pub fn parse(raw: &str) -> Result<Self, anyhow::Error> {
        let expanded = expand_env_placeholders(raw)?;
        let cfg: Self = serde_yaml::from_str(&expanded)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(
            !self.sensors.is_empty(),
            "config must include at least one sensor"
        );
        anyhow::ensure!(
            !self.credentials.client_id.is_empty(),
            "credentials.client_id cannot be empty"
        );
        anyhow::ensure!(
            !self.credentials.client_secret.is_empty(),
            "credentials.client_secret cannot be empty"
        );
        anyhow::ensure!(
            (1..=MAX_REPORT_DAYS).contains(&self.report.days),
            "report.days must be between 1 and {}, got {}",
            MAX_REPORT_DAYS,
            self.report.days
        );
        if let Some(sensor) = self.sensors.iter().find(|s| s.id.trim().is_empty()) {
            anyhow::bail!("sensor '{}' has an empty id", sensor.name);
        }
        Ok(())
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" is an escaped "$"; any other "$" is kept as-is.
fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let close = match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };

        it.next(); // opening delimiter
        let var = read_until(&mut it, close)
            .with_context(|| format!("unterminated env placeholder: missing '{}'", close))?;
        let val = std::env::var(&var)
            .with_context(|| format!("missing environment variable: {}", var))?;
        out.push_str(&val);
    }

    Ok(out)
}

/// Read characters until `end`, consuming it. `None` if input runs out first.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}
