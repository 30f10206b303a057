//! Client for the Gardener core API

use super::{ShootInfo, ShootSource};
use crate::config::{ConfigError, GardenerSettings};
use crate::error::{Result, check_status};
use crate::validation::OidcConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const SERVICE: &str = "Gardener";

#[derive(Debug, Deserialize)]
struct Shoot {
    metadata: ShootMetadata,
    #[serde(default)]
    spec: ShootSpec,
}

#[derive(Debug, Deserialize)]
struct ShootMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ShootSpec {
    #[serde(default)]
    kubernetes: Kubernetes,
    #[serde(default)]
    provider: Provider,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Kubernetes {
    #[serde(rename = "kubeAPIServer")]
    kube_api_server: Option<KubeApiServer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeApiServer {
    oidc_config: Option<OidcConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct Provider {
    #[serde(default)]
    workers: Vec<Worker>,
}

#[derive(Debug, Deserialize)]
struct Worker {
    machine: Machine,
}

#[derive(Debug, Deserialize)]
struct Machine {
    #[serde(rename = "type")]
    machine_type: String,
}

impl From<Shoot> for ShootInfo {
    fn from(shoot: Shoot) -> Self {
        Self {
            name: shoot.metadata.name,
            oidc_config: shoot
                .spec
                .kubernetes
                .kube_api_server
                .and_then(|server| server.oidc_config),
            machine_type: shoot
                .spec
                .provider
                .workers
                .into_iter()
                .next()
                .map(|worker| worker.machine.machine_type),
        }
    }
}

/// Reads shoots from one Gardener project namespace
#[derive(Clone)]
pub struct GardenerClient {
    http: reqwest::Client,
    api_url: String,
    namespace: String,
    token: String,
}

impl std::fmt::Debug for GardenerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenerClient")
            .field("api_url", &self.api_url)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl GardenerClient {
    pub fn new(settings: &GardenerSettings) -> Result<Self> {
        Url::parse(&settings.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "gardener.api_url".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(settings.request_timeout())
                .build()?,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            namespace: settings.namespace.clone(),
            token: settings.token.clone(),
        })
    }

    fn shoot_url(&self, name: &str) -> String {
        format!(
            "{}/apis/core.gardener.cloud/v1beta1/namespaces/{}/shoots/{}",
            self.api_url, self.namespace, name
        )
    }
}

#[async_trait]
impl ShootSource for GardenerClient {
    async fn shoot(&self, name: &str) -> Result<ShootInfo> {
        debug!("Fetching shoot {} in {}", name, self.namespace);
        let response = self
            .http
            .get(self.shoot_url(name))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let shoot: Shoot = check_status(SERVICE, response).await?.json().await?;
        Ok(shoot.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHOOT_PATH: &str =
        "/apis/core.gardener.cloud/v1beta1/namespaces/garden-kyma/shoots/c-abc";

    fn client(server: &MockServer) -> GardenerClient {
        GardenerClient::new(&GardenerSettings {
            api_url: server.uri(),
            namespace: "garden-kyma".to_string(),
            token: "gardener-token".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_shoot_parses_oidc_and_machine_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SHOOT_PATH))
            .and(header("Authorization", "Bearer gardener-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"name": "c-abc", "namespace": "garden-kyma"},
                "spec": {
                    "kubernetes": {
                        "version": "1.30",
                        "kubeAPIServer": {
                            "oidcConfig": {
                                "clientID": "client-1",
                                "issuerURL": "https://issuer.example.com",
                                "groupsClaim": "groups",
                                "usernameClaim": "sub",
                                "usernamePrefix": "-",
                                "signingAlgs": ["RS256"]
                            }
                        }
                    },
                    "provider": {
                        "type": "aws",
                        "workers": [
                            {"name": "cpu-worker-0", "machine": {"type": "m6i.large"}}
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        let shoot = client(&server).shoot("c-abc").await.unwrap();

        assert_eq!(shoot.name, "c-abc");
        assert_eq!(shoot.machine_type.as_deref(), Some("m6i.large"));
        let oidc = shoot.oidc_config.unwrap();
        assert_eq!(oidc.client_id, "client-1");
        assert_eq!(oidc.signing_algs, vec!["RS256".to_string()]);
    }

    #[tokio::test]
    async fn test_shoot_without_oidc() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SHOOT_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"metadata": {"name": "c-abc"}})),
            )
            .mount(&server)
            .await;

        let shoot = client(&server).shoot("c-abc").await.unwrap();
        assert!(shoot.oidc_config.is_none());
        assert!(shoot.machine_type.is_none());
    }

    #[tokio::test]
    async fn test_missing_shoot_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SHOOT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).shoot("c-abc").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Gardener"));
    }
}
