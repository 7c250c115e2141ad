//! Error types for the buildscope client

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the buildscope client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Every attempt of a retried request failed
    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// Writing the build cache failed
    #[error("Failed to write build cache at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ids handed to a batch fetch were not an ascending sequence
    #[error("Invalid build range: {0}")]
    InvalidRange(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Self::NotFound(_) | Self::ApiError { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self.root(), Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self.root(), Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if this is a transport failure worth another attempt
    ///
    /// Every failed request or error status qualifies. Bodies that arrived
    /// but could not be parsed do not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::ApiError { .. })
    }

    /// The error behind any retry wrapping
    fn root(&self) -> &Self {
        match self {
            Self::RetriesExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let missing = ClientError::api_error(404, "no such build");
        assert!(missing.is_not_found());
        assert!(missing.is_client_error());
        assert!(missing.is_transient());

        let unavailable = ClientError::api_error(503, "maintenance");
        assert!(unavailable.is_server_error());
        assert!(unavailable.is_transient());

        assert!(!ClientError::ParseError("eof".to_string()).is_transient());
        assert!(!ClientError::NotFound("step".to_string()).is_transient());
    }

    #[test]
    fn test_classification_sees_through_retries() {
        let err = ClientError::RetriesExhausted {
            attempts: 3,
            source: Box::new(ClientError::api_error(404, "missing")),
        };
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = ClientError::RetriesExhausted {
            attempts: 3,
            source: Box::new(ClientError::api_error(502, "bad gateway")),
        };
        assert_eq!(
            err.to_string(),
            "Giving up after 3 attempts: API error (status 502): bad gateway"
        );
    }
}
