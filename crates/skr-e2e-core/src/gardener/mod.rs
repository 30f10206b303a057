//! Gardener shoot access

pub mod client;

pub use client::GardenerClient;

use crate::error::Result;
use crate::validation::OidcConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The parts of a shoot the e2e checks look at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShootInfo {
    pub name: String,
    /// `spec.kubernetes.kubeAPIServer.oidcConfig`
    pub oidc_config: Option<OidcConfig>,
    /// Machine type of the first worker pool
    pub machine_type: Option<String>,
}

#[async_trait]
pub trait ShootSource: Send + Sync {
    async fn shoot(&self, name: &str) -> Result<ShootInfo>;
}
