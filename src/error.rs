use thiserror::Error;

/// The request never produced an HTTP response (connect, TLS, timeout).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failure of a token grant or refresh exchange.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Token endpoint rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Not authenticated - call authenticate first")]
    NotAuthenticated,
}

/// Failure of an authorized data request after a token was obtained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),
}

pub type Result<T> = std::result::Result<T, AppError>;
