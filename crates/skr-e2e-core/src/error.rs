//! Unified error handling for skr-e2e-core
//!
//! One error type covers the broker, KCP and Gardener collaborators as well
//! as the two poll outcomes that end a test scenario.
//!
//! # Example
//!
//! ```rust
//! use skr_e2e_core::CoreError;
//! use std::time::Duration;
//!
//! let err = CoreError::PollTimeout {
//!     instance_id: "instance-1".to_string(),
//!     operation_id: "op-1".to_string(),
//!     timeout: Duration::from_secs(60),
//!     cause: "operation op-1 did not finish".to_string(),
//!     runtime_status: "{}".to_string(),
//!     events: "none".to_string(),
//! };
//! assert!(err.is_timeout());
//! assert!(err.to_string().contains("Runtime status"));
//! ```

use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Core error type for all e2e helpers
#[derive(Error, Debug)]
pub enum CoreError {
    /// A collaborator API answered with a non-success status
    #[error("{service} API error (HTTP {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The HTTP request itself failed (connect, TLS, decode)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The kcp CLI could not be run or exited unsuccessfully
    #[error("kcp {command} failed: {message}")]
    Kcp { command: String, message: String },

    /// Operation did not reach a terminal state before the deadline
    #[error("{cause}\nRuntime status: {runtime_status}\nEvents:\n{events}")]
    PollTimeout {
        instance_id: String,
        operation_id: String,
        timeout: Duration,
        cause: String,
        runtime_status: String,
        events: String,
    },

    /// Operation reached the `failed` state
    #[error(
        "Operation {operation_id} for instance {instance_id} did not succeed:\n{record}\n\
         Runtime status: {runtime_status}"
    )]
    OperationFailed {
        instance_id: String,
        operation_id: String,
        record: String,
        runtime_status: String,
    },

    /// An assertion about runtime state did not hold
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns the HTTP status if this error came from a collaborator API
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Api { status, .. } => Some(*status),
            CoreError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::PollTimeout { .. } => true,
            CoreError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the polled operation ended in the `failed` state
    #[must_use]
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Request(e) => e.is_timeout() || e.is_connect(),
            CoreError::PollTimeout { .. } => true,
            _ => self.is_server_error() || self.status() == Some(429),
        }
    }
}

/// Pass a successful response through, otherwise turn it into [`CoreError::Api`]
///
/// The body becomes the message; an empty body falls back to the status line.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CoreError::Api {
        service,
        status: status.as_u16(),
        message: if body.is_empty() {
            status.to_string()
        } else {
            body
        },
    })
}
