//! Error types for skr-tester
//!
//! Wraps library errors with hints on how to fix the invocation or the
//! environment.

use colored::Colorize;
use skr_e2e_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: No [keb] section configured.
///
///   tip: Add a [keb] section to the config file
///       skr-tester --config-file ./skr-tester.toml provision ...
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the skr-tester binary
#[derive(Error, Debug)]
pub enum SkrTesterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable {name} is required")]
    MissingEnv { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("kcp error: {message}")]
    Kcp { message: String },

    #[error("{message}")]
    Timeout { message: String },

    #[error("{message}")]
    OperationFailed { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for skr-tester operations
pub type Result<T> = std::result::Result<T, SkrTesterError>;

impl SkrTesterError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            SkrTesterError::Configuration(message) if message.contains("[kcp]") => vec![
                "Export KCP_AUTH_TYPE, KCP_KEB_API_URL and the other KCP_* variables".to_string(),
                "Or add a [kcp] section to the config file".to_string(),
            ],
            SkrTesterError::Configuration(_) => vec![
                "Pass a config file explicitly: skr-tester --config-file <path> ...".to_string(),
                "Or set SKR_TESTER_CONFIG_FILE".to_string(),
            ],
            SkrTesterError::MissingEnv { name } => vec![
                format!("Export {} before running skr-tester", name),
                "All KCP_* variables are required once KCP_OIDC_CLIENT_SECRET is set".to_string(),
            ],
            SkrTesterError::AuthenticationFailed { .. } => vec![
                "Check client_id and client_secret in the [keb.oauth] section".to_string(),
                "Ensure token_url points at the OAuth2 token endpoint".to_string(),
            ],
            SkrTesterError::Kcp { .. } => vec![
                "Check that the kcp binary is on PATH".to_string(),
                "Run `kcp login` manually to verify the credentials".to_string(),
            ],
            SkrTesterError::Timeout { .. } => vec![
                "Increase the deadline: --wait-timeout <seconds>".to_string(),
                "Resume waiting later: skr-tester wait -i <instance-id> --operation-id <id>"
                    .to_string(),
            ],
            SkrTesterError::ApiError { message } if message.contains("HTTP 404") => vec![
                "Verify the instance ID is correct".to_string(),
                "Check that the instance has not been deprovisioned already".to_string(),
            ],
            SkrTesterError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the broker URL in the [keb] section".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        // Poll errors carry multi-line runtime dumps after the headline
        let message = self.to_string();
        let mut diag = match message.split_once('\n') {
            Some((headline, rest)) => CliDiagnostic::error(headline).detail(rest),
            None => CliDiagnostic::error(&message),
        };

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<ConfigError> for SkrTesterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingEnv { name } => SkrTesterError::MissingEnv { name },
            other => SkrTesterError::Configuration(other.to_string()),
        }
    }
}

impl From<CoreError> for SkrTesterError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(config_err) => SkrTesterError::from(config_err),
            CoreError::Validation(message) => SkrTesterError::InvalidInput { message },
            CoreError::Kcp { .. } => SkrTesterError::Kcp {
                message: err.to_string(),
            },
            CoreError::PollTimeout { .. } => SkrTesterError::Timeout {
                message: err.to_string(),
            },
            CoreError::OperationFailed { .. } => SkrTesterError::OperationFailed {
                message: err.to_string(),
            },
            CoreError::Request(ref reqwest_err) if reqwest_err.is_connect() => {
                SkrTesterError::ConnectionError {
                    message: err.to_string(),
                }
            }
            ref api_err if api_err.is_unauthorized() => SkrTesterError::AuthenticationFailed {
                message: err.to_string(),
            },
            _ => SkrTesterError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for SkrTesterError {
    fn from(err: serde_json::Error) -> Self {
        SkrTesterError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for SkrTesterError {
    fn from(err: serde_yaml::Error) -> Self {
        SkrTesterError::OutputError {
            message: format!("YAML error: {}", err),
        }
    }
}
