use std::time::Duration;

use serde::Serialize;
use skr_e2e_core::workflows::deprovision_runtime;

use super::wait::progress_spinner;
use crate::cli::DeprovisionArgs;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

#[derive(Debug, Serialize)]
struct DeprovisionSummary {
    instance_id: String,
    operation_id: String,
    waited: bool,
}

/// `skr-tester deprovision`
pub async fn handle_deprovision(
    conn_mgr: &ConnectionManager,
    args: &DeprovisionArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let keb = conn_mgr.create_keb_client().await?;
    let kcp = conn_mgr.create_kcp_client()?;
    let wait = args.async_ops.wait;

    let (pb, callback) = progress_spinner(
        &format!("Deprovisioning instance {}", args.instance_id),
        wait && output.is_text(),
    );

    let operation_id = deprovision_runtime(
        &keb,
        &kcp,
        &args.instance_id,
        Duration::from_secs(args.async_ops.wait_timeout),
        Duration::from_secs(args.async_ops.wait_interval),
        wait,
        Some(callback),
    )
    .await
    .inspect_err(|_| pb.abandon())?;

    print_output(
        DeprovisionSummary {
            instance_id: args.instance_id.clone(),
            operation_id,
            waited: wait,
        },
        output,
    )
}
