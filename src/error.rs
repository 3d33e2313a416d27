//! Error types for the REST API client core.
//!
//! # Error Classification
//!
//! Errors fall into two groups with different propagation rules:
//!
//! - **Transient**: the remote host could not be reached
//!   ([`ApiError::Connection`]). Version discovery treats this as "no
//!   versions found" instead of failing.
//! - **Structural**: the request or a response is malformed
//!   ([`ApiError::Json`], [`ApiError::Discovery`], ...). These always
//!   propagate; a broken discovery document means a broken service.
//!
//! Non-2xx statuses are never errors at this layer. Mapping them onto
//! resource-level errors belongs to the callers of [`crate::Session`].

use thiserror::Error;

/// REST API client errors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote host could not be reached.
    #[error("Connection error for {url}: {message}")]
    Connection {
        /// URL that was being requested.
        url: String,
        /// Underlying failure description.
        message: String,
    },

    /// Transport failure other than connecting (timeout, TLS, protocol).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Discovery document decoded but has an unexpected structure.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Authentication plugin failed to decorate a request.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Whether this error means the host could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection { .. })
    }
}

/// Result type alias for REST API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ApiError::Connection {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                message: err.to_string(),
            }
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for ApiError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        ApiError::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for ApiError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        ApiError::InvalidHeader(err.to_string())
    }
}
