//! kcp CLI access
//!
//! The control-plane CLI is the only place that exposes runtime status
//! operations and runtime events, so the poller uses it for diagnostics.

pub mod client;

pub use client::KcpClient;

use crate::error::Result;
use async_trait::async_trait;

/// Diagnostic dumps for a runtime, keyed by instance ID
#[async_trait]
pub trait RuntimeDiagnostics: Send + Sync {
    /// Runtime status including its operations, as JSON text
    async fn runtime_status(&self, instance_id: &str) -> Result<String>;

    /// Event log of the runtime
    async fn runtime_events(&self, instance_id: &str) -> Result<String>;
}
