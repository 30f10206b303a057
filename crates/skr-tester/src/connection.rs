//! Connection management for the KEB, kcp and Gardener clients

use crate::error::Result as CliResult;
use skr_e2e_core::config::KcpSettings;
use skr_e2e_core::{Config, GardenerClient, KcpClient, KebClient};
use tracing::{debug, info};

/// Builds collaborator clients from the loaded configuration
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Broker client, authenticated when `[keb.oauth]` is configured
    pub async fn create_keb_client(&self) -> CliResult<KebClient> {
        let settings = self.config.keb()?;
        info!("Connecting to KEB: {}", settings.url);
        let client = KebClient::connect(settings).await?;
        debug!("KEB client created successfully");
        Ok(client)
    }

    /// kcp client
    ///
    /// When --config-file is given explicitly, environment variables are
    /// ignored. Otherwise the `KCP_*` variables win as soon as
    /// `KCP_OIDC_CLIENT_SECRET` is set, and every one of them is required.
    /// Without either source the `kcp` on PATH is used as already configured.
    pub fn create_kcp_client(&self) -> CliResult<KcpClient> {
        let use_env_vars = self.config_path.is_none();
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let settings = if use_env_vars && std::env::var_os("KCP_OIDC_CLIENT_SECRET").is_some() {
            info!("Using kcp settings from environment variables");
            Some(KcpSettings::from_env()?)
        } else {
            self.config.kcp.clone()
        };

        match settings {
            Some(settings) => {
                settings.write_cli_config()?;
                debug!("Wrote kcp config to {}", settings.config_path.display());
                Ok(KcpClient::new(&settings))
            }
            None => {
                debug!("No kcp settings, using kcp from PATH as configured");
                Ok(KcpClient::with_binary("kcp"))
            }
        }
    }

    pub fn create_gardener_client(&self) -> CliResult<GardenerClient> {
        let settings = self.config.gardener()?;
        info!("Connecting to Gardener: {}", settings.api_url);
        Ok(GardenerClient::new(settings)?)
    }
}
