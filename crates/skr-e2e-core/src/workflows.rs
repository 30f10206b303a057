//! Runtime lifecycle workflows that compose broker calls with polling
//!
//! These workflows handle the common e2e patterns:
//! - Submit a request, poll the returned operation, fetch the resulting shoot
//! - Look up runtime facts (shoot name, catalog, kubeconfig)
//! - Persist the kubeconfig for later test steps

use crate::error::{CoreError, Result};
use crate::gardener::{ShootInfo, ShootSource};
use crate::kcp::RuntimeDiagnostics;
use crate::keb::{BrokerApi, ProvisionRequest, UpdateRequest};
use crate::operation::OperationResponse;
use crate::progress::{ProgressCallback, ensure_operation_succeeded};
use crate::validation::{OidcConfig, ensure_kubeconfig_mentions_oidc};
use directories::BaseDirs;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Result of a provisioning or update run
#[derive(Debug, Clone)]
pub struct RuntimeOutcome {
    pub operation_id: String,
    pub shoot: ShootInfo,
}

fn require_operation_id(response: OperationResponse) -> Result<String> {
    response
        .operation
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::Validation("No operation ID returned".to_string()))
}

/// Provision a runtime and wait for it
///
/// This workflow:
/// 1. Submits the provisioning request
/// 2. Polls the returned operation until it succeeds
/// 3. Reads the shoot name from the KCP runtime status
/// 4. Fetches the shoot from Gardener
///
/// # Example
///
/// ```rust,ignore
/// use skr_e2e_core::keb::ProvisionRequest;
/// use skr_e2e_core::progress::DEFAULT_INTERVAL;
/// use skr_e2e_core::workflows::provision_runtime_and_wait;
/// use std::time::Duration;
///
/// let request = ProvisionRequest::new(&instance_id, &plan_id, "e2e", "eu-central-1");
/// let outcome = provision_runtime_and_wait(
///     &keb,
///     &kcp,
///     &gardener,
///     &request,
///     Duration::from_secs(3600),
///     DEFAULT_INTERVAL,
///     None,
/// )
/// .await?;
/// println!("Shoot {}", outcome.shoot.name);
/// ```
pub async fn provision_runtime_and_wait<B, K, G>(
    broker: &B,
    kcp: &K,
    gardener: &G,
    request: &ProvisionRequest,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<RuntimeOutcome>
where
    B: BrokerApi + ?Sized,
    K: RuntimeDiagnostics + ?Sized,
    G: ShootSource + ?Sized,
{
    let operation_id = require_operation_id(broker.provision(request).await?)?;
    debug!("Operation ID {}", operation_id);

    ensure_operation_succeeded(
        broker,
        kcp,
        &request.instance_id,
        &operation_id,
        timeout,
        interval,
        on_progress,
    )
    .await?;

    debug!("Fetching runtime operation status...");
    let status: Value = serde_json::from_str(&kcp.runtime_status(&request.instance_id).await?)?;
    let shoot_name = status
        .pointer("/data/0/shootName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "runtime status of instance {} has no shoot name",
                request.instance_id
            ))
        })?;

    debug!("Fetching shoot info from gardener...");
    let shoot = gardener.shoot(shoot_name).await?;

    Ok(RuntimeOutcome {
        operation_id,
        shoot,
    })
}

/// Update a runtime, wait for the operation, then re-read its shoot
#[allow(clippy::too_many_arguments)]
pub async fn update_runtime_and_wait<B, K, G>(
    broker: &B,
    kcp: &K,
    gardener: &G,
    instance_id: &str,
    shoot_name: &str,
    request: &UpdateRequest,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<RuntimeOutcome>
where
    B: BrokerApi + ?Sized,
    K: RuntimeDiagnostics + ?Sized,
    G: ShootSource + ?Sized,
{
    let operation_id = require_operation_id(broker.update(instance_id, request).await?)?;
    debug!("Operation ID {}", operation_id);

    ensure_operation_succeeded(
        broker,
        kcp,
        instance_id,
        &operation_id,
        timeout,
        interval,
        on_progress,
    )
    .await?;

    let shoot = gardener.shoot(shoot_name).await?;
    Ok(RuntimeOutcome {
        operation_id,
        shoot,
    })
}

/// Deprovision a runtime
///
/// Returns the operation ID. The operation is only polled when
/// `ensure_success` is set.
pub async fn deprovision_runtime<B, K>(
    broker: &B,
    kcp: &K,
    instance_id: &str,
    timeout: Duration,
    interval: Duration,
    ensure_success: bool,
    on_progress: Option<ProgressCallback>,
) -> Result<String>
where
    B: BrokerApi + ?Sized,
    K: RuntimeDiagnostics + ?Sized,
{
    let operation_id = require_operation_id(broker.deprovision(instance_id).await?)?;
    info!("Deprovision SKR - operation ID {}", operation_id);

    if ensure_success {
        ensure_operation_succeeded(
            broker,
            kcp,
            instance_id,
            &operation_id,
            timeout,
            interval,
            on_progress,
        )
        .await?;
    }

    Ok(operation_id)
}

/// Shoot name of the single runtime behind an instance
pub async fn shoot_name<B: BrokerApi + ?Sized>(broker: &B, instance_id: &str) -> Result<String> {
    let runtimes = broker.runtimes(instance_id).await?;
    match runtimes.data.as_slice() {
        [runtime] => Ok(runtime.shoot_name.clone()),
        other => Err(CoreError::Validation(format!(
            "expected exactly one runtime for instance {}, found {}",
            instance_id,
            other.len()
        ))),
    }
}

/// The broker's OSB catalog
pub async fn catalog<B: BrokerApi + ?Sized>(broker: &B) -> Result<Value> {
    broker.catalog().await
}

/// Download the customer-facing kubeconfig and check its OIDC settings
pub async fn ensure_valid_oidc_config_in_kubeconfig<B: BrokerApi + ?Sized>(
    broker: &B,
    instance_id: &str,
    expected: &OidcConfig,
) -> Result<()> {
    let kubeconfig = broker.kubeconfig(instance_id).await?;
    ensure_kubeconfig_mentions_oidc(&kubeconfig, expected)
}

/// `~/.kube`
pub fn default_kube_dir() -> Result<PathBuf> {
    let dirs = BaseDirs::new().ok_or_else(|| {
        CoreError::Validation("could not determine the home directory".to_string())
    })?;
    Ok(dirs.home_dir().join(".kube"))
}

/// Write `kubeconfig` to `<dir>/config`, creating `dir` when needed
///
/// Returns the written path.
pub async fn save_kubeconfig(kubeconfig: &str, dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => default_kube_dir()?,
    };
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join("config");
    tokio::fs::write(&path, kubeconfig).await?;
    debug!("Saved kubeconfig to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keb::{OperationSource, RuntimeInfo, RuntimeList};
    use crate::operation::Operation;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(120);
    const INTERVAL: Duration = Duration::from_secs(30);

    #[derive(Default)]
    struct FakeBroker {
        operation_id: Option<String>,
        states: Mutex<VecDeque<&'static str>>,
        runtimes: Vec<&'static str>,
        kubeconfig: String,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBroker {
        fn new(states: &[&'static str]) -> Self {
            Self {
                operation_id: Some("op-1".to_string()),
                states: Mutex::new(states.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn record(&self, call: impl Into<String>) -> OperationResponse {
            self.calls.lock().unwrap().push(call.into());
            OperationResponse {
                operation: self.operation_id.clone(),
                dashboard_url: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OperationSource for FakeBroker {
        async fn operation(
            &self,
            _instance_id: &str,
            _operation_id: &str,
        ) -> Result<Option<Operation>> {
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop_front()
            } else {
                states.front().copied()
            };
            Ok(state.map(Operation::with_state))
        }
    }

    #[async_trait]
    impl BrokerApi for FakeBroker {
        async fn provision(&self, request: &ProvisionRequest) -> Result<OperationResponse> {
            Ok(self.record(format!("provision {}", request.instance_id)))
        }

        async fn update(
            &self,
            instance_id: &str,
            _request: &UpdateRequest,
        ) -> Result<OperationResponse> {
            Ok(self.record(format!("update {instance_id}")))
        }

        async fn deprovision(&self, instance_id: &str) -> Result<OperationResponse> {
            Ok(self.record(format!("deprovision {instance_id}")))
        }

        async fn runtimes(&self, instance_id: &str) -> Result<RuntimeList> {
            let data: Vec<RuntimeInfo> = self
                .runtimes
                .iter()
                .map(|shoot| RuntimeInfo {
                    instance_id: instance_id.to_string(),
                    shoot_name: shoot.to_string(),
                    ..Default::default()
                })
                .collect();
            Ok(RuntimeList {
                count: data.len(),
                total_count: data.len(),
                data,
            })
        }

        async fn catalog(&self) -> Result<Value> {
            Ok(json!({"services": []}))
        }

        async fn kubeconfig(&self, _instance_id: &str) -> Result<String> {
            Ok(self.kubeconfig.clone())
        }
    }

    struct FakeKcp {
        status: String,
    }

    #[async_trait]
    impl RuntimeDiagnostics for FakeKcp {
        async fn runtime_status(&self, _instance_id: &str) -> Result<String> {
            Ok(self.status.clone())
        }

        async fn runtime_events(&self, _instance_id: &str) -> Result<String> {
            Ok("no events".to_string())
        }
    }

    fn kcp_with_shoot(shoot: &str) -> FakeKcp {
        FakeKcp {
            status: json!({"data": [{"shootName": shoot}]}).to_string(),
        }
    }

    struct FakeGardener;

    #[async_trait]
    impl ShootSource for FakeGardener {
        async fn shoot(&self, name: &str) -> Result<ShootInfo> {
            Ok(ShootInfo {
                name: name.to_string(),
                oidc_config: None,
                machine_type: Some("m6i.large".to_string()),
            })
        }
    }

    fn provision_request() -> ProvisionRequest {
        ProvisionRequest::new("inst-1", "plan-1", "e2e", "eu-central-1")
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_waits_and_fetches_shoot() {
        let broker = FakeBroker::new(&["in progress", "succeeded"]);

        let outcome = provision_runtime_and_wait(
            &broker,
            &kcp_with_shoot("c-abc"),
            &FakeGardener,
            &provision_request(),
            TIMEOUT,
            INTERVAL,
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.operation_id, "op-1");
        assert_eq!(outcome.shoot.name, "c-abc");
        assert_eq!(broker.calls(), vec!["provision inst-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_requires_shoot_name() {
        let broker = FakeBroker::new(&["succeeded"]);
        let kcp = FakeKcp {
            status: json!({"data": [{"shootName": ""}]}).to_string(),
        };

        let err = provision_runtime_and_wait(
            &broker,
            &kcp,
            &FakeGardener,
            &provision_request(),
            TIMEOUT,
            INTERVAL,
            None,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("no shoot name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_without_operation_id() {
        let broker = FakeBroker {
            operation_id: None,
            ..FakeBroker::new(&["succeeded"])
        };

        let err = provision_runtime_and_wait(
            &broker,
            &kcp_with_shoot("c-abc"),
            &FakeGardener,
            &provision_request(),
            TIMEOUT,
            INTERVAL,
            None,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("No operation ID returned"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_propagates_failed_operation() {
        let broker = FakeBroker::new(&["failed"]);

        let err = update_runtime_and_wait(
            &broker,
            &kcp_with_shoot("c-abc"),
            &FakeGardener,
            "inst-1",
            "c-abc",
            &UpdateRequest::default().parameter("machineType", "m6i.xlarge"),
            TIMEOUT,
            INTERVAL,
            None,
        )
        .await
        .unwrap_err();

        assert!(err.is_operation_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_returns_shoot() {
        let broker = FakeBroker::new(&["succeeded"]);

        let outcome = update_runtime_and_wait(
            &broker,
            &kcp_with_shoot("c-abc"),
            &FakeGardener,
            "inst-1",
            "c-abc",
            &UpdateRequest::default(),
            TIMEOUT,
            INTERVAL,
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.shoot.machine_type.as_deref(), Some("m6i.large"));
        assert_eq!(broker.calls(), vec!["update inst-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deprovision_without_waiting_skips_polling() {
        // A pending operation would time out if it were polled
        let broker = FakeBroker::new(&["in progress"]);

        let id = deprovision_runtime(
            &broker,
            &kcp_with_shoot("c-abc"),
            "inst-1",
            Duration::from_secs(10),
            INTERVAL,
            false,
            None,
        )
        .await
        .unwrap();

        assert_eq!(id, "op-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deprovision_waits_when_requested() {
        let broker = FakeBroker::new(&["in progress"]);

        let err = deprovision_runtime(
            &broker,
            &kcp_with_shoot("c-abc"),
            "inst-1",
            Duration::from_secs(10),
            INTERVAL,
            true,
            None,
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_shoot_name_requires_single_runtime() {
        let broker = FakeBroker {
            runtimes: vec!["c-abc"],
            ..Default::default()
        };
        assert_eq!(shoot_name(&broker, "inst-1").await.unwrap(), "c-abc");

        let broker = FakeBroker {
            runtimes: vec!["c-abc", "c-def"],
            ..Default::default()
        };
        let err = shoot_name(&broker, "inst-1").await.unwrap_err();
        assert!(err.to_string().contains("found 2"));

        let err = shoot_name(&FakeBroker::default(), "inst-1").await.unwrap_err();
        assert!(err.to_string().contains("found 0"));
    }

    #[tokio::test]
    async fn test_kubeconfig_oidc_check() {
        let expected = OidcConfig {
            client_id: "client-1".to_string(),
            issuer_url: "https://issuer.example.com".to_string(),
            groups_claim: String::new(),
            username_claim: String::new(),
            username_prefix: String::new(),
            signing_algs: Vec::new(),
        };
        let broker = FakeBroker {
            kubeconfig: "--oidc-issuer-url=https://issuer.example.com\n--oidc-client-id=client-1\n"
                .to_string(),
            ..Default::default()
        };
        ensure_valid_oidc_config_in_kubeconfig(&broker, "inst-1", &expected)
            .await
            .unwrap();

        let broker = FakeBroker {
            kubeconfig: "apiVersion: v1\n".to_string(),
            ..Default::default()
        };
        assert!(
            ensure_valid_oidc_config_in_kubeconfig(&broker, "inst-1", &expected)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_save_kubeconfig_creates_directory() {
        let dir = TempDir::new().unwrap();
        let kube_dir = dir.path().join("home").join(".kube");

        let path = save_kubeconfig("apiVersion: v1\n", Some(&kube_dir))
            .await
            .unwrap();

        assert_eq!(path, kube_dir.join("config"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "apiVersion: v1\n");
    }
}
