//! Unified error handling for pai-core
//!
//! Every failure the SDK can surface is a [`PaiError`]. Service errors keep the
//! server's error code, message and request id so callers can report them, and the
//! helper predicates let callers branch on the kind without matching every variant.
//!
//! # Example
//!
//! ```rust
//! use pai_core::PaiError;
//!
//! fn describe(err: &PaiError) -> &'static str {
//!     if err.is_not_found() {
//!         "missing"
//!     } else if err.is_timeout() {
//!         "slow"
//!     } else {
//!         "broken"
//!     }
//! }
//!
//! let err = PaiError::Validation("need a name".to_string());
//! assert_eq!(describe(&err), "broken");
//! assert!(err.is_bad_request());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for all PAI operations
#[derive(Error, Debug)]
pub enum PaiError {
    /// The addressed resource does not exist (HTTP 404)
    #[error("Resource not found: {message}")]
    NotFound {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Credentials were rejected or lack permission (HTTP 401/403)
    #[error("Authentication failed: {message}")]
    Unauthorized {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// The server rejected the request as malformed (HTTP 400)
    #[error("Bad request [{code}]: {message}")]
    BadRequest {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Request was throttled (HTTP 429 or a Throttling code)
    #[error("Rate limited: {message}")]
    RateLimited {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Any other failed service call, including 2xx bodies carrying an error code
    #[error("Service call {action} failed (HTTP {status}) [{code}]: {message}")]
    Api {
        action: String,
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Connectivity, TLS or protocol failure below the API layer
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body or local document did not match the expected shape
    #[error("Failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local precondition failed before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Polling observed a status from which the target can not be reached
    #[error("Unexpected status '{status}' while waiting for '{target}'")]
    UnexpectedStatus { status: String, target: String },

    /// Polling gave up
    #[error("Timed out after {timeout:?} waiting for status '{target}'")]
    WaitTimeout { target: String, timeout: Duration },

    /// Configuration or credential resolution failure
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, PaiError>;

impl PaiError {
    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaiError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PaiError::Unauthorized { .. })
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            PaiError::Api { status, .. } => *status >= 500,
            PaiError::Transport(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Returns true if this is a timeout error, either HTTP or polling
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            PaiError::Transport(e) => e.is_timeout(),
            PaiError::WaitTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PaiError::RateLimited { .. })
    }

    /// Returns true if the request was rejected as invalid, locally or by the server
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, PaiError::BadRequest { .. } | PaiError::Validation(_))
    }

    /// Returns true if the wait ended on a status in the unexpected set
    #[must_use]
    pub fn is_unexpected_status(&self) -> bool {
        matches!(self, PaiError::UnexpectedStatus { .. })
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            PaiError::RateLimited { .. } => true,
            PaiError::Transport(e) => e.is_connect() || e.is_timeout(),
            PaiError::WaitTimeout { .. } => true,
            _ => self.is_server_error(),
        }
    }

    /// Request id reported by the service, if any
    pub fn request_id(&self) -> Option<&str> {
        match self {
            PaiError::NotFound { request_id, .. }
            | PaiError::Unauthorized { request_id, .. }
            | PaiError::BadRequest { request_id, .. }
            | PaiError::RateLimited { request_id, .. }
            | PaiError::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Build the error for a failed service call from its HTTP status and body fields
    pub(crate) fn from_service(
        action: &str,
        status: u16,
        code: Option<String>,
        message: Option<String>,
        request_id: Option<String>,
    ) -> Self {
        let code = code.unwrap_or_else(|| status.to_string());
        let message = message.unwrap_or_else(|| format!("{action} returned HTTP {status}"));

        if status == 429 || code.starts_with("Throttling") {
            return PaiError::RateLimited {
                code,
                message,
                request_id,
            };
        }

        match status {
            404 => PaiError::NotFound {
                code,
                message,
                request_id,
            },
            401 | 403 => PaiError::Unauthorized {
                code,
                message,
                request_id,
            },
            400 => PaiError::BadRequest {
                code,
                message,
                request_id,
            },
            _ => PaiError::Api {
                action: action.to_string(),
                status,
                code,
                message,
                request_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_service_maps_status() {
        let err = PaiError::from_service(
            "GetDataset",
            404,
            Some("DatasetNotFound".to_string()),
            Some("no such dataset".to_string()),
            Some("req-1".to_string()),
        );
        assert!(err.is_not_found());
        assert_eq!(err.request_id(), Some("req-1"));

        let err = PaiError::from_service("CreateModel", 400, None, None, None);
        assert!(err.is_bad_request());
        assert!(!err.is_retryable());

        let err = PaiError::from_service("ListJobs", 403, None, None, None);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_throttling_code_is_rate_limited() {
        let err = PaiError::from_service(
            "ListServices",
            400,
            Some("Throttling.User".to_string()),
            Some("slow down".to_string()),
            None,
        );
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = PaiError::from_service("GetJob", 503, None, None, None);
        assert!(err.is_server_error());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("GetJob"));
    }

    #[test]
    fn test_wait_errors_are_distinct() {
        let timeout = PaiError::WaitTimeout {
            target: "Running".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_unexpected_status());

        let unexpected = PaiError::UnexpectedStatus {
            status: "Failed".to_string(),
            target: "Running".to_string(),
        };
        assert!(unexpected.is_unexpected_status());
        assert!(!unexpected.is_timeout());
        assert!(unexpected.to_string().contains("Failed"));
    }

    #[test]
    fn test_default_code_and_message() {
        let err = PaiError::from_service("DeleteImage", 500, None, None, None);
        match err {
            PaiError::Api { code, message, .. } => {
                assert_eq!(code, "500");
                assert!(message.contains("DeleteImage"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
