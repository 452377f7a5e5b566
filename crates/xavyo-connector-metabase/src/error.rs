//! Error types for the Metabase connector.

use thiserror::Error;
use xavyo_connector::error::ConnectorError;

/// Result type alias using `MetabaseError`.
pub type MetabaseResult<T> = Result<T, MetabaseError>;

/// Errors that can occur when talking to a Metabase instance.
#[derive(Debug, Error)]
pub enum MetabaseError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metabase API returned an error status.
    #[error("Metabase API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Page token could not be decoded.
    #[error("Invalid page token: {0:?}")]
    InvalidPageToken(String),
}

impl MetabaseError {
    /// Whether the failure is expected to clear on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            MetabaseError::RateLimited { .. } => true,
            MetabaseError::Api { status, .. } => matches!(status, 502..=504),
            MetabaseError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Wrap a client failure with the engine operation that produced it.
pub(crate) fn backend_error(context: impl Into<String>, err: MetabaseError) -> ConnectorError {
    if let MetabaseError::InvalidPageToken(_) = err {
        return ConnectorError::invalid_argument(format!("{}: {err}", context.into()));
    }
    if err.is_transient() {
        ConnectorError::transient_backend(context, err)
    } else {
        ConnectorError::backend(context, err)
    }
}
