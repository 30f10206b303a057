//! Configuration management for the e2e helpers
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with one section per collaborator.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{ConfigError, Result};
use crate::keb::{KYMA_SERVICE_ID, PlatformContext};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Kyma Environment Broker connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keb: Option<KebSettings>,
    /// kcp CLI settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kcp: Option<KcpSettings>,
    /// Gardener API connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gardener: Option<GardenerSettings>,
    /// Operation polling defaults
    #[serde(default)]
    pub poll: PollSettings,
}

/// Broker connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KebSettings {
    /// Base URL of the broker, without the `/oauth/v2` prefix
    pub url: String,
    #[serde(default = "default_service_id")]
    pub service_id: String,
    /// Plan used for provisioning and deprovisioning
    pub plan_id: String,
    /// Account identity sent in the OSB context
    #[serde(default)]
    pub platform: PlatformContext,
    /// Client-credentials flow; requests are unauthenticated without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthSettings>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// OAuth2 client-credentials settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OAuthSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Settings for the kcp CLI wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KcpSettings {
    /// Path or name of the kcp binary
    #[serde(default = "default_kcp_binary")]
    pub binary: String,
    /// Where the generated kcp config file is written
    #[serde(default = "default_kcp_config_path")]
    pub config_path: PathBuf,
    pub auth_type: String,
    pub keb_api_url: String,
    #[serde(default)]
    pub oidc_issuer_url: String,
    #[serde(default)]
    pub gardener_namespace: String,
    #[serde(default)]
    pub oidc_client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub kubeconfig_api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mothership_api_url: Option<String>,
}

/// The YAML file consumed by `kcp --config`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct KcpCliConfig {
    pub auth_type: String,
    pub gardener_namespace: String,
    pub oidc_client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub keb_api_url: String,
    pub oidc_issuer_url: String,
    pub kubeconfig_api_url: String,
}

/// Gardener API connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GardenerSettings {
    pub api_url: String,
    /// Project namespace holding the shoots, e.g. `garden-kyma-dev`
    pub namespace: String,
    pub token: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Polling defaults for broker operations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollSettings {
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            interval_secs: default_poll_interval(),
        }
    }
}

impl PollSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl KebSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GardenerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl KcpSettings {
    /// Build settings from the `KCP_*` environment variables
    ///
    /// Every variable is required; the first missing one is reported.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            binary: default_kcp_binary(),
            config_path: default_kcp_config_path(),
            auth_type: required_env("KCP_AUTH_TYPE")?,
            keb_api_url: required_env("KCP_KEB_API_URL")?,
            oidc_issuer_url: required_env("KCP_OIDC_ISSUER_URL")?,
            gardener_namespace: required_env("KCP_GARDENER_NAMESPACE")?,
            username: Some(required_env("KCP_TECH_USER_LOGIN")?),
            password: Some(required_env("KCP_TECH_USER_PASSWORD")?),
            oidc_client_id: required_env("KCP_OIDC_CLIENT_ID")?,
            mothership_api_url: Some(required_env("KCP_MOTHERSHIP_API_URL")?),
            kubeconfig_api_url: required_env("KCP_KUBECONFIG_API_URL")?,
            oidc_client_secret: Some(required_env("KCP_OIDC_CLIENT_SECRET")?),
        })
    }

    /// Settings for the kcp config file
    pub fn cli_config(&self) -> KcpCliConfig {
        KcpCliConfig {
            auth_type: self.auth_type.clone(),
            gardener_namespace: self.gardener_namespace.clone(),
            oidc_client_id: self.oidc_client_id.clone(),
            oidc_client_secret: self.oidc_client_secret.clone(),
            username: self.username.clone(),
            keb_api_url: self.keb_api_url.clone(),
            oidc_issuer_url: self.oidc_issuer_url.clone(),
            kubeconfig_api_url: self.kubeconfig_api_url.clone(),
        }
    }

    /// Write the kcp config file to `config_path`
    pub fn write_cli_config(&self) -> Result<()> {
        let content = serde_yaml::to_string(&self.cli_config())?;
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        fs::write(&self.config_path, content).map_err(|e| ConfigError::SaveError {
            path: self.config_path.display().to_string(),
            source: e,
        })
    }
}

impl Config {
    /// Broker settings, or an error pointing at the missing section
    pub fn keb(&self) -> Result<&KebSettings> {
        self.keb.as_ref().ok_or_else(|| ConfigError::MissingSection {
            section: "keb",
            suggestion: "Add a [keb] section with url and plan_id.".to_string(),
        })
    }

    /// kcp settings, or an error pointing at the missing section
    pub fn kcp(&self) -> Result<&KcpSettings> {
        self.kcp.as_ref().ok_or_else(|| ConfigError::MissingSection {
            section: "kcp",
            suggestion: "Add a [kcp] section or export the KCP_* environment variables."
                .to_string(),
        })
    }

    /// Gardener settings, or an error pointing at the missing section
    pub fn gardener(&self) -> Result<&GardenerSettings> {
        self.gardener
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection {
                section: "gardener",
                suggestion: "Add a [gardener] section with api_url, namespace and token."
                    .to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/skr-tester/config.toml
    /// On macOS: ~/Library/Application Support/io.kyma-project.skr-tester/config.toml
    /// On Windows: %APPDATA%\kyma-project\skr-tester\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "kyma-project", "skr-tester")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is so unused sections do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv {
            name: name.to_string(),
        }),
    }
}

fn default_service_id() -> String {
    KYMA_SERVICE_ID.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_kcp_binary() -> String {
    "kcp".to_string()
}

fn default_kcp_config_path() -> PathBuf {
    PathBuf::from("config.yaml")
}

fn default_poll_timeout() -> u64 {
    60 * 60
}

fn default_poll_interval() -> u64 {
    30
}
