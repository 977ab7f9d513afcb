//! Error types for portfolio-feed
//!
//! Two layers of errors live here:
//! - [`FetchError`] - the per-identifier failure carried inside a
//!   [`FetchOutcome`](crate::types::FetchOutcome); it never aborts a batch
//! - [`Error`] - the crate-level error returned by configuration, the record
//!   store, the user service and the API server
//!
//! [`ToHttpStatus`] and [`ApiError`] map crate errors onto HTTP responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for portfolio-feed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to fetch one identifier
///
/// Both variants carry the identifier they were raised for, so a consumer
/// receiving outcomes out of order can still attribute them.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote endpoint could not be reached or rejected the request
    #[error("transport failure for {identifier}: {reason}")]
    Transport {
        /// Identifier the request was issued for
        identifier: String,
        /// HTTP status when the endpoint answered with a non-success code
        status: Option<u16>,
        /// Human-readable cause (connection refused, timeout, status text)
        reason: String,
    },

    /// The response body did not match the expected payload shape
    #[error("decode failure for {identifier}: {source}")]
    Decode {
        /// Identifier the request was issued for
        identifier: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Identifier this failure belongs to
    pub fn identifier(&self) -> &str {
        match self {
            FetchError::Transport { identifier, .. } | FetchError::Decode { identifier, .. } => {
                identifier
            }
        }
    }

    /// HTTP status returned by the endpoint, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            FetchError::Decode { .. } => None,
        }
    }

    /// True for connection-level or status failures
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    /// True when the body arrived but could not be parsed
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode { .. })
    }
}

/// Main error type for portfolio-feed
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "provider.base_url")
        key: Option<String>,
    },

    /// A request was rejected before any work was done
    #[error("validation error: {0}")]
    Validation(String),

    /// User not found in the record store
    #[error("user {id} not found")]
    UserNotFound {
        /// The user id that was not found
        id: i64,
    },

    /// A user with the same id is already stored
    #[error("user {id} already exists")]
    Duplicate {
        /// The conflicting user id
        id: i64,
    },

    /// HTTP client could not be constructed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "user_not_found",
///     "message": "user 7 not found",
///     "details": {
///       "user_id": 7
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "user_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::UserNotFound { .. } => 404,

            // 409 Conflict
            Error::Duplicate { .. } => 409,

            // 422 Unprocessable Entity
            Error::Validation(_) => 422,

            // 500 Internal Server Error
            Error::Network(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::UserNotFound { .. } => "user_not_found",
            Error::Duplicate { .. } => "duplicate",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::UserNotFound { id } | Error::Duplicate { id } => Some(serde_json::json!({
                "user_id": id,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
