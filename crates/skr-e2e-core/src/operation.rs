//! Broker operation records
//!
//! KEB tracks every provisioning, update and deprovisioning request as an
//! operation scoped to a service instance. The record is mostly opaque to
//! the tests; only its `state` drives the poller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// State of a broker operation
///
/// The broker reports an open set of values. Only `succeeded` and `failed`
/// are terminal, and they are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationState {
    Succeeded,
    Failed,
    InProgress,
    Pending,
    Other(String),
}

impl OperationState {
    pub fn as_str(&self) -> &str {
        match self {
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
            OperationState::InProgress => "in progress",
            OperationState::Pending => "pending",
            OperationState::Other(s) => s.as_str(),
        }
    }

    /// Returns true for `succeeded` and `failed`
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }
}

impl From<&str> for OperationState {
    fn from(value: &str) -> Self {
        match value {
            "succeeded" => OperationState::Succeeded,
            "failed" => OperationState::Failed,
            "in progress" => OperationState::InProgress,
            "pending" => OperationState::Pending,
            other => OperationState::Other(other.to_string()),
        }
    }
}

impl From<String> for OperationState {
    fn from(value: String) -> Self {
        OperationState::from(value.as_str())
    }
}

impl From<OperationState> for String {
    fn from(state: OperationState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation as returned by the broker's `last_operation` endpoint
///
/// Fields other than `state` and `description` are kept in `extra` so the
/// whole record can be rendered into error messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<OperationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Operation {
    pub fn with_state(state: impl Into<OperationState>) -> Self {
        Self {
            state: Some(state.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.as_ref().is_some_and(OperationState::is_terminal)
    }

    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.state == Some(OperationState::Succeeded)
    }

    /// State as a display string, `<none>` when the broker omitted it
    pub fn state_label(&self) -> &str {
        self.state.as_ref().map_or("<none>", OperationState::as_str)
    }

    /// Human-readable JSON rendering of the full record
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Response to an asynchronous broker request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}
