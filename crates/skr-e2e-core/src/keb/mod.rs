//! Kyma Environment Broker (KEB) access
//!
//! KEB is an Open Service Broker. Runtime lifecycle requests are accepted
//! asynchronously and answered with an operation ID that is then polled via
//! [`OperationSource`].

pub mod client;
pub mod types;

pub use client::KebClient;
pub use types::*;

use crate::error::Result;
use crate::operation::{Operation, OperationResponse};
use async_trait::async_trait;
use serde_json::Value;

/// Capability for reading the current record of an operation
///
/// `Ok(None)` means the broker does not know the operation (yet).
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn operation(&self, instance_id: &str, operation_id: &str)
    -> Result<Option<Operation>>;
}

/// The broker endpoints used by the lifecycle workflows
#[async_trait]
pub trait BrokerApi: OperationSource {
    async fn provision(&self, request: &ProvisionRequest) -> Result<OperationResponse>;

    async fn update(&self, instance_id: &str, request: &UpdateRequest)
    -> Result<OperationResponse>;

    async fn deprovision(&self, instance_id: &str) -> Result<OperationResponse>;

    async fn runtimes(&self, instance_id: &str) -> Result<RuntimeList>;

    async fn catalog(&self) -> Result<Value>;

    /// Customer-facing kubeconfig of the runtime
    async fn kubeconfig(&self, instance_id: &str) -> Result<String>;
}
