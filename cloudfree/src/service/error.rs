//! Error types for imagery service calls.

use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by the remote imagery service or its transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The HTTP client could not be created or the request never completed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with an error envelope.
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// Credentials are missing.
    #[error("not authenticated: {0}")]
    Auth(String),
}

impl ServiceError {
    /// The remote diagnostic message, if the service provided one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ServiceError::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}
