//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Drive SKR lifecycle operations against the Kyma Environment Broker
#[derive(Parser, Debug)]
#[command(name = "skr-tester")]
#[command(version, about = "SKR lifecycle tester for the Kyma Environment Broker")]
#[command(long_about = "
SKR lifecycle tester for the Kyma Environment Broker

Provisions, updates and deprovisions SAP Kyma Runtimes (SKRs) and waits for
the broker operations to finish. Failed or stuck operations are reported with
the runtime status and events from kcp.

EXAMPLES:
    # Provision a runtime and wait until it is ready
    skr-tester provision -p 361c511f-f939-4621-b228-d0fb79a1fe15 -r eu-central-1 --wait

    # Switch the runtime to the next supported machine type
    skr-tester update -i INSTANCE_ID -p PLAN_ID --update-machine-type

    # Wait for an operation that was started earlier
    skr-tester wait -i INSTANCE_ID --operation-id OPERATION_ID

    # Deprovision and wait
    skr-tester deprovision -i INSTANCE_ID --wait

For more help on a specific command, run:
    skr-tester <command> --help
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "SKR_TESTER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a new runtime
    #[command(visible_alias = "p")]
    Provision(ProvisionArgs),

    /// Update an existing runtime
    #[command(visible_alias = "u")]
    Update(UpdateArgs),

    /// Deprovision a runtime
    #[command(visible_alias = "d")]
    Deprovision(DeprovisionArgs),

    /// Wait for a broker operation to reach a terminal state
    Wait(WaitArgs),

    /// Download the customer-facing kubeconfig of a runtime
    Kubeconfig(KubeconfigArgs),
}

/// Common CLI arguments for async operations
#[derive(Args, Debug, Clone)]
pub struct AsyncOperationArgs {
    /// Wait for the operation to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds
    #[arg(long, default_value = "3600", requires = "wait")]
    pub wait_timeout: u64,

    /// Polling interval in seconds
    #[arg(long, default_value = "30", requires = "wait")]
    pub wait_interval: u64,
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Plan ID of the runtime
    #[arg(long, short = 'p', required = true)]
    pub plan_id: String,

    /// Region of the runtime
    #[arg(long, short = 'r', required = true)]
    pub region: String,

    /// Runtime name; generated from the instance ID when omitted
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Instance ID; a random UUID when omitted
    #[arg(long, short = 'i')]
    pub instance_id: Option<String>,

    #[command(flatten)]
    pub async_ops: AsyncOperationArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Instance ID of the runtime
    #[arg(long, short = 'i', required = true)]
    pub instance_id: String,

    /// Plan ID of the runtime
    #[arg(long, short = 'p', required = true)]
    pub plan_id: String,

    /// Switch to the next machine type supported by the plan
    #[arg(long, short = 'm')]
    pub update_machine_type: bool,

    #[command(flatten)]
    pub async_ops: AsyncOperationArgs,
}

#[derive(Args, Debug)]
pub struct DeprovisionArgs {
    /// Instance ID of the runtime
    #[arg(long, short = 'i', required = true)]
    pub instance_id: String,

    #[command(flatten)]
    pub async_ops: AsyncOperationArgs,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Instance ID of the runtime
    #[arg(long, short = 'i', required = true)]
    pub instance_id: String,

    /// Operation to wait for
    #[arg(long, required = true)]
    pub operation_id: String,

    /// Maximum time to wait in seconds (defaults to [poll] timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Polling interval in seconds (defaults to [poll] interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Args, Debug)]
pub struct KubeconfigArgs {
    /// Instance ID of the runtime
    #[arg(long, short = 'i', required = true)]
    pub instance_id: String,

    /// Save to <dir>/config instead of printing
    #[arg(long)]
    pub save: bool,

    /// Directory for --save (defaults to ~/.kube)
    #[arg(long, requires = "save")]
    pub dir: Option<PathBuf>,

    /// Require this OIDC issuer URL in the kubeconfig
    #[arg(long, requires = "oidc_client_id")]
    pub oidc_issuer_url: Option<String>,

    /// Require this OIDC client ID in the kubeconfig
    #[arg(long, requires = "oidc_issuer_url")]
    pub oidc_client_id: Option<String>,
}
