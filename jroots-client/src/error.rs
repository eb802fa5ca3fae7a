//! Client error types
//!
//! Every fallible client operation reports a [`ClientError`]. The image cache
//! swallows these at its public `fetch_image` boundary and logs them instead.

use std::sync::Arc;

use jroots_model::{ImageId, ModelError};
use reqwest::StatusCode;
use thiserror::Error;

/// Main client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network unreachable, timeout, or body read failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a status the operation does not accept
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The server rejected the bearer token
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// `304 Not Modified` arrived for an image the cache cannot vouch for
    #[error("Server reported image {0} not modified but no matching cache entry exists")]
    UnexpectedNotModified(ImageId),

    /// The cache was dropped while a request was in flight
    #[error("Image cache closed")]
    CacheClosed,

    /// The task driving an image request panicked or was cancelled
    #[error("Image fetch task failed: {0}")]
    FetchTask(String),

    /// Another caller's in-flight request for the same image failed
    #[error("{0}")]
    Joined(Arc<ClientError>),

    /// Token decoding or expiry failure
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Model constructor or validation failure
    #[error("Invalid input: {0}")]
    Model(#[from] ModelError),

    /// Token or configuration persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration (de)serialization failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Recovers an owned error from a result shared between joined callers.
    pub(crate) fn from_shared(err: Arc<ClientError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(ClientError::Joined)
    }

    /// True for failures the caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Request(e) => e.is_timeout() || e.is_connect(),
            ClientError::Status { status, .. } => status.is_server_error(),
            ClientError::Joined(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

/// Token-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid token payload: {0}")]
    InvalidPayload(String),
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_error_unwraps_when_uniquely_owned() {
        let err = ClientError::from_shared(Arc::new(ClientError::Unauthorized));
        assert!(matches!(err, ClientError::Unauthorized));
    }

    #[test]
    fn shared_error_wraps_when_still_referenced() {
        let shared = Arc::new(ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream".into(),
        });
        let err = ClientError::from_shared(shared.clone());
        assert!(matches!(err, ClientError::Joined(_)));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), shared.to_string());
    }
}
