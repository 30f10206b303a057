use anyhow::Result;
use clap::Parser;
use skr_e2e_core::Config;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::SkrTesterError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = match &cli.config_file {
        Some(path) => {
            debug!("Loading config from explicit path: {:?}", path);
            Config::load_from_path(path).map(|config| (config, Some(path.clone())))
        }
        None => {
            debug!("Loading config from default location");
            Config::load().map(|config| (config, None))
        }
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            SkrTesterError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "skr_tester=warn,skr_e2e_core=warn",
            1 => "skr_tester=info,skr_e2e_core=info",
            2 => "skr_tester=debug,skr_e2e_core=debug",
            _ => "skr_tester=trace,skr_e2e_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), SkrTesterError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Provision(args) => {
            commands::provision::handle_provision(conn_mgr, args, cli.output).await
        }
        Commands::Update(args) => commands::update::handle_update(conn_mgr, args, cli.output).await,
        Commands::Deprovision(args) => {
            commands::deprovision::handle_deprovision(conn_mgr, args, cli.output).await
        }
        Commands::Wait(args) => commands::wait::handle_wait(conn_mgr, args, cli.output).await,
        Commands::Kubeconfig(args) => {
            commands::kubeconfig::handle_kubeconfig(conn_mgr, args, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Command completed successfully in {:.3}s",
            duration.as_secs_f64()
        ),
        Err(e) => info!(
            "Command failed after {:.3}s: {}",
            duration.as_secs_f64(),
            e
        ),
    }

    result
}

/// Format command for human-readable logging, without credentials
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Provision(args) => format!(
            "provision --plan-id {} --region {}",
            args.plan_id, args.region
        ),
        Commands::Update(args) => format!("update --instance-id {}", args.instance_id),
        Commands::Deprovision(args) => format!("deprovision --instance-id {}", args.instance_id),
        Commands::Wait(args) => format!(
            "wait --instance-id {} --operation-id {}",
            args.instance_id, args.operation_id
        ),
        Commands::Kubeconfig(args) => format!("kubeconfig --instance-id {}", args.instance_id),
    }
}
