use std::time::Duration;

use serde::Serialize;
use skr_e2e_core::gardener::ShootInfo;
use skr_e2e_core::keb::{BrokerApi, UpdateRequest};
use skr_e2e_core::validation::{next_machine_type, supported_machine_types};
use skr_e2e_core::workflows::{catalog, shoot_name, update_runtime_and_wait};
use tracing::info;

use super::wait::progress_spinner;
use crate::cli::UpdateArgs;
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, SkrTesterError};
use crate::output::{OutputFormat, print_output};

#[derive(Debug, Serialize)]
struct UpdateSummary {
    instance_id: String,
    previous_machine_type: String,
    machine_type: String,
    operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shoot: Option<ShootInfo>,
}

/// `skr-tester update`
pub async fn handle_update(
    conn_mgr: &ConnectionManager,
    args: &UpdateArgs,
    output: OutputFormat,
) -> CliResult<()> {
    if !args.update_machine_type {
        return Err(SkrTesterError::InvalidInput {
            message: "nothing to update, pass --update-machine-type".to_string(),
        });
    }

    let keb = conn_mgr.create_keb_client().await?;
    let kcp = conn_mgr.create_kcp_client()?;

    let current = kcp.current_machine_type(&args.instance_id).await?;
    info!("Current machine type: {}", current);

    let machine_types = supported_machine_types(&catalog(&keb).await?, &args.plan_id)?;
    let target = next_machine_type(&machine_types, &current).ok_or_else(|| {
        SkrTesterError::InvalidInput {
            message: format!(
                "no other machine type to switch to from {} (supported: {})",
                current,
                machine_types.join(", ")
            ),
        }
    })?;
    info!("Determined machine type to update: {}", target);

    let platform = conn_mgr.config.keb()?.platform.clone();
    let request = UpdateRequest::new(platform).parameter("machineType", target.clone());

    let (operation_id, shoot) = if args.async_ops.wait {
        let gardener = conn_mgr.create_gardener_client()?;
        let shoot = shoot_name(&keb, &args.instance_id).await?;
        let (pb, callback) = progress_spinner(
            &format!("Updating instance {}", args.instance_id),
            output.is_text(),
        );

        let outcome = update_runtime_and_wait(
            &keb,
            &kcp,
            &gardener,
            &args.instance_id,
            &shoot,
            &request,
            Duration::from_secs(args.async_ops.wait_timeout),
            Duration::from_secs(args.async_ops.wait_interval),
            Some(callback),
        )
        .await
        .inspect_err(|_| pb.abandon())?;
        (outcome.operation_id, Some(outcome.shoot))
    } else {
        let response = keb.update(&args.instance_id, &request).await?;
        let operation_id = response
            .operation
            .ok_or_else(|| SkrTesterError::ApiError {
                message: "No operation ID returned".to_string(),
            })?;
        (operation_id, None)
    };

    print_output(
        UpdateSummary {
            instance_id: args.instance_id.clone(),
            previous_machine_type: current,
            machine_type: target,
            operation_id,
            shoot,
        },
        output,
    )
}
