//! Wrapper around the `kcp` binary

use super::RuntimeDiagnostics;
use crate::config::KcpSettings;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, trace};

const MACHINE_TYPE_QUERY: &str =
    "custom=:{.runtimeConfig.spec.shoot.provider.workers[0].machine.type}";

/// Runs kcp subcommands, logging in before each one
#[derive(Debug, Clone)]
pub struct KcpClient {
    binary: String,
    config_path: Option<PathBuf>,
    credentials: Option<(String, String)>,
}

impl KcpClient {
    pub fn new(settings: &KcpSettings) -> Self {
        let credentials = match (&settings.username, &settings.password) {
            (Some(user), Some(password)) if settings.oidc_client_secret.is_some() => {
                Some((user.clone(), password.clone()))
            }
            _ => None,
        };

        Self {
            binary: settings.binary.clone(),
            config_path: Some(settings.config_path.clone()),
            credentials,
        }
    }

    /// Client for a kcp that is already configured and logged in
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            config_path: None,
            credentials: None,
        }
    }

    pub async fn login(&self) -> Result<()> {
        let mut args = vec!["login".to_string()];
        if let Some((user, password)) = &self.credentials {
            args.extend(["-u".to_string(), user.clone(), "-p".to_string(), password.clone()]);
        }
        self.exec(&args).await.map(|_| ())
    }

    /// Runtime status with all operations, as JSON
    pub async fn runtime_status_operations(&self, instance_id: &str) -> Result<String> {
        self.run(&["rt", "-i", instance_id, "--ops", "-o", "json"])
            .await
    }

    pub async fn runtime_events(&self, instance_id: &str) -> Result<String> {
        self.run(&["rt", "-i", instance_id, "--events"]).await
    }

    /// Machine type of the first worker pool of the runtime
    pub async fn current_machine_type(&self, instance_id: &str) -> Result<String> {
        let output = self
            .run(&[
                "rt",
                "-i",
                instance_id,
                "--runtime-config",
                "-o",
                MACHINE_TYPE_QUERY,
            ])
            .await?;
        Ok(output.trim().to_string())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        self.login().await?;
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.exec(&args).await
    }

    async fn exec(&self, args: &[String]) -> Result<String> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let mut command = Command::new(&self.binary);
        command.args(args).kill_on_drop(true);
        if let Some(path) = &self.config_path {
            command.arg("--config").arg(path);
        }

        debug!("Running kcp {}", subcommand);
        let output = command.output().await.map_err(|e| CoreError::Kcp {
            command: subcommand.clone(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        trace!("kcp {} output: {}", subcommand, stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Kcp {
                command: subcommand,
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(stdout)
    }
}

#[async_trait]
impl RuntimeDiagnostics for KcpClient {
    async fn runtime_status(&self, instance_id: &str) -> Result<String> {
        self.runtime_status_operations(instance_id).await
    }

    async fn runtime_events(&self, instance_id: &str) -> Result<String> {
        KcpClient::runtime_events(self, instance_id).await
    }
}
