//! Configuration for the e2e helpers
//!
//! Settings for each collaborator live in their own TOML section:
//!
//! ```toml
//! [keb]
//! url = "https://kyma-env-broker.example.com"
//! plan_id = "361c511f-f939-4621-b228-d0fb79a1fe15"
//!
//! [keb.oauth]
//! token_url = "https://oauth.example.com/oauth2/token"
//! client_id = "${KEB_CLIENT_ID}"
//! client_secret = "${KEB_CLIENT_SECRET}"
//!
//! [kcp]
//! auth_type = "clientCredentials"
//! keb_api_url = "https://kyma-env-broker.example.com"
//!
//! [gardener]
//! api_url = "https://api.gardener.example.com"
//! namespace = "garden-kyma-dev"
//! token = "${GARDENER_TOKEN}"
//!
//! [poll]
//! timeout_secs = 3600
//! interval_secs = 30
//! ```

#[allow(clippy::module_inception)]
pub mod config;
pub mod error;

pub use config::{
    Config, GardenerSettings, KcpCliConfig, KcpSettings, KebSettings, OAuthSettings, PollSettings,
};
pub use error::{ConfigError, Result};
