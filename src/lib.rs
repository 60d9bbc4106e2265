pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod services;

// Re-export commonly used items
pub use api::{ApiClient, ConsumptionSource};
pub use auth::{Credential, Session, TokenManager, TokenState, TokenStatus};
pub use config::Config;
pub use error::{AppError, AuthError, RequestError, Result};
pub use services::DashboardService;
