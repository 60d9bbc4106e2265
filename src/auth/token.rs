//! OAuth2 client-credentials grant with refresh against the reseller token endpoints.

use super::clock::{Clock, SystemClock};
use crate::error::{AppError, AuthError, RequestError};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_AUTH_BASE_URL: &str = "https://smart-meter-reseller-api.voltaware.com";
const TOKEN_PATH: &str = "/auth/token";
const REFRESH_PATH: &str = "/auth/token/refresh";

/// Client id and secret, fixed for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Cached bearer token. Valid strictly before `expires_at`.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token response shared by the grant and refresh endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in_secs: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub token_url: String,
    pub refresh_url: String,
}

impl AuthEndpoints {
    pub fn from_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            token_url: format!("{}{}", base, TOKEN_PATH),
            refresh_url: format!("{}{}", base, REFRESH_PATH),
        }
    }
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self::from_base(DEFAULT_AUTH_BASE_URL)
    }
}

/// Performs the grant and refresh exchanges and issues bearer-authorized requests.
///
/// The manager holds no token itself; callers own the [`TokenState`] and pass
/// it in. A state is only overwritten when an exchange succeeds.
pub struct TokenManager<T, C = SystemClock> {
    credential: Credential,
    endpoints: AuthEndpoints,
    transport: T,
    clock: C,
}

impl<T: HttpTransport> TokenManager<T> {
    pub fn new(credential: Credential, endpoints: AuthEndpoints, transport: T) -> Self {
        Self::with_clock(credential, endpoints, transport, SystemClock)
    }
}

impl<T: HttpTransport, C: Clock> TokenManager<T, C> {
    pub fn with_clock(
        credential: Credential,
        endpoints: AuthEndpoints,
        transport: T,
        clock: C,
    ) -> Self {
        Self {
            credential,
            endpoints,
            transport,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Initial client-credentials grant.
    pub fn authenticate(&self) -> Result<TokenState, AuthError> {
        let body = json!({
            "grant_type": "client_credentials",
            "client_id": self.credential.client_id,
            "client_secret": self.credential.client_secret,
        });

        let data = self.exchange(&self.endpoints.token_url, body)?;
        // the grant must hand out both tokens
        let refresh_token = data.refresh_token.ok_or_else(|| {
            AuthError::InvalidResponse("token grant did not include a refresh_token".to_string())
        })?;
        let state = TokenState {
            expires_at: self.expiry_from_now(data.expires_in_secs)?,
            access_token: data.access_token,
            refresh_token: Some(refresh_token),
        };

        info!(
            client_id = %self.credential.client_id,
            expires_at = %state.expires_at,
            "Authenticated against token endpoint"
        );
        Ok(state)
    }

    /// Exchange the cached refresh token for a new access token.
    ///
    /// The refresh endpoint does not always return a new refresh token; the
    /// previous one is carried forward in that case.
    pub fn refresh(&self, state: &TokenState) -> Result<TokenState, AuthError> {
        let refresh_token = state
            .refresh_token
            .as_deref()
            .ok_or(AuthError::MissingRefreshToken)?;

        let body = json!({
            "grant_type": "refresh_token",
            "client_id": self.credential.client_id,
            "refresh_token": refresh_token,
        });

        let data = self.exchange(&self.endpoints.refresh_url, body)?;
        let refreshed = TokenState {
            expires_at: self.expiry_from_now(data.expires_in_secs)?,
            access_token: data.access_token,
            refresh_token: data.refresh_token.or_else(|| state.refresh_token.clone()),
        };

        debug!(expires_at = %refreshed.expires_at, "Access token refreshed");
        Ok(refreshed)
    }

    /// Return the cached token while it is valid, refreshing it first otherwise.
    pub fn get_valid_token(&self, state: &mut TokenState) -> Result<String, AuthError> {
        let now = self.clock.now();
        if state.is_valid_at(now) {
            return Ok(state.access_token.clone());
        }

        debug!(expired_at = %state.expires_at, "Access token expired, refreshing");
        *state = self.refresh(state)?;
        Ok(state.access_token.clone())
    }

    /// Send `request` with a valid bearer token. No retry on failure.
    pub fn authorized_request(
        &self,
        state: &mut TokenState,
        request: HttpRequest,
    ) -> Result<HttpResponse, AppError> {
        let token = self.get_valid_token(state)?;
        let url = request.url.clone();

        let response = self
            .transport
            .send(request.bearer(&token))
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request failed");
                RequestError::Transport(e.0)
            })?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Request returned error status");
            return Err(RequestError::Status {
                status: response.status,
                message: response.body,
            }
            .into());
        }

        Ok(response)
    }

    fn exchange(&self, url: &str, body: serde_json::Value) -> Result<TokenResponse, AuthError> {
        let response = self
            .transport
            .send(HttpRequest::post_json(url, body))
            .map_err(|e| {
                warn!(url = %url, error = %e, "Token endpoint unreachable");
                AuthError::Transport(e.0)
            })?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Token exchange rejected");
            return Err(AuthError::Rejected {
                status: response.status,
                message: response.body,
            });
        }

        response
            .json()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    fn expiry_from_now(&self, expires_in_secs: u64) -> Result<DateTime<Utc>, AuthError> {
        i64::try_from(expires_in_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!(
                    "expires_in_secs out of range: {}",
                    expires_in_secs
                ))
            })
    }
}
