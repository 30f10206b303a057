use std::time::Duration;

use serde::Serialize;
use skr_e2e_core::gardener::ShootInfo;
use skr_e2e_core::keb::{BrokerApi, BtpOperatorCredentials, ProvisionRequest};
use skr_e2e_core::workflows::provision_runtime_and_wait;
use tracing::info;
use uuid::Uuid;

use super::wait::progress_spinner;
use crate::cli::ProvisionArgs;
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, SkrTesterError};
use crate::output::{OutputFormat, print_output};

#[derive(Debug, Serialize)]
struct ProvisionSummary {
    instance_id: String,
    operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shoot: Option<ShootInfo>,
}

/// Runtime name derived from the instance ID, e.g. `skr-e2e-1a2b3c4d`
fn default_name(instance_id: &str) -> String {
    let suffix: String = instance_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    format!("skr-e2e-{}", suffix.to_lowercase())
}

fn build_request(
    conn_mgr: &ConnectionManager,
    args: &ProvisionArgs,
) -> CliResult<ProvisionRequest> {
    let instance_id = args
        .instance_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| default_name(&instance_id));

    let platform = conn_mgr.config.keb()?.platform.clone();
    Ok(
        ProvisionRequest::new(instance_id, args.plan_id.clone(), name, args.region.clone())
            .platform(platform)
            .btp_operator_credentials(BtpOperatorCredentials::dummy()),
    )
}

/// `skr-tester provision`
pub async fn handle_provision(
    conn_mgr: &ConnectionManager,
    args: &ProvisionArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let request = build_request(conn_mgr, args)?;
    info!(
        "Provisioning instance {} in {}",
        request.instance_id, request.region
    );
    let keb = conn_mgr.create_keb_client().await?;

    if !args.async_ops.wait {
        let response = keb.provision(&request).await?;
        let operation_id = response
            .operation
            .ok_or_else(|| SkrTesterError::ApiError {
                message: "No operation ID returned".to_string(),
            })?;
        return print_output(
            ProvisionSummary {
                instance_id: request.instance_id,
                operation_id,
                shoot: None,
            },
            output,
        );
    }

    let kcp = conn_mgr.create_kcp_client()?;
    let gardener = conn_mgr.create_gardener_client()?;
    let (pb, callback) = progress_spinner(
        &format!("Provisioning instance {}", request.instance_id),
        output.is_text(),
    );

    let outcome = provision_runtime_and_wait(
        &keb,
        &kcp,
        &gardener,
        &request,
        Duration::from_secs(args.async_ops.wait_timeout),
        Duration::from_secs(args.async_ops.wait_interval),
        Some(callback),
    )
    .await
    .inspect_err(|_| pb.abandon())?;

    print_output(
        ProvisionSummary {
            instance_id: request.instance_id,
            operation_id: outcome.operation_id,
            shoot: Some(outcome.shoot),
        },
        output,
    )
}
