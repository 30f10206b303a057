//! # skr-e2e-core
//!
//! Shared engine for end-to-end tests of managed Kyma runtimes (SKRs).
//!
//! The crate talks to three collaborators:
//!
//! - **KEB** - the Kyma Environment Broker, an Open Service Broker that
//!   accepts provisioning, update and deprovisioning requests and exposes
//!   their operations
//! - **KCP** - the control-plane CLI, used for runtime status and event dumps
//! - **Gardener** - the cluster-provisioning API that owns the shoot clusters
//!
//! On top of them it provides:
//!
//! - [`ensure_operation_succeeded`] - poll a broker operation until it reaches
//!   a terminal state, enriching failures with runtime diagnostics
//! - [`workflows`] - provision / update / deprovision a runtime and wait
//! - [`validation`] - OIDC and kubeconfig assertions, machine type rotation
//! - [`config`] - TOML configuration with environment variable expansion
//!
//! Every collaborator is reached through a trait ([`OperationSource`],
//! [`BrokerApi`], [`RuntimeDiagnostics`], [`ShootSource`]) so tests can swap
//! in fakes and drive the poller on a paused tokio clock.
//!
//! ## Example
//!
//! ```rust,ignore
//! use skr_e2e_core::{KcpClient, KebClient, ensure_operation_succeeded};
//! use skr_e2e_core::progress::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
//!
//! let keb = KebClient::connect(config.keb()?).await?;
//! let kcp = KcpClient::new(config.kcp()?);
//!
//! let operation = ensure_operation_succeeded(
//!     &keb,
//!     &kcp,
//!     "instance-id",
//!     "operation-id",
//!     DEFAULT_TIMEOUT,
//!     DEFAULT_INTERVAL,
//!     None,
//! )
//! .await?;
//! ```

pub mod config;
pub mod error;
pub mod gardener;
pub mod kcp;
pub mod keb;
pub mod operation;
pub mod progress;
pub mod validation;
pub mod workflows;

pub use config::{Config, ConfigError};
pub use error::{CoreError, Result};
pub use gardener::{GardenerClient, ShootInfo, ShootSource};
pub use kcp::{KcpClient, RuntimeDiagnostics};
pub use keb::{BrokerApi, KebClient, OperationSource};
pub use operation::{Operation, OperationResponse, OperationState};
pub use progress::{ProgressCallback, ProgressEvent, ensure_operation_succeeded};
pub use validation::OidcConfig;
