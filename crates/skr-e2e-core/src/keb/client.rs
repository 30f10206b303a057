//! HTTP client for the Kyma Environment Broker

use super::types::{BROKER_API_VERSION, ProvisionRequest, RuntimeList, UpdateRequest};
use super::{BrokerApi, OperationSource};
use crate::config::{ConfigError, KebSettings, OAuthSettings};
use crate::error::{Result, check_status};
use crate::operation::{Operation, OperationResponse};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

/// User agent string for broker requests
const USER_AGENT: &str = concat!("skr-e2e/", env!("CARGO_PKG_VERSION"));

const SERVICE: &str = "KEB";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Broker client speaking the OSB API plus the KEB runtime endpoints
#[derive(Clone)]
pub struct KebClient {
    http: reqwest::Client,
    base_url: String,
    service_id: String,
    plan_id: String,
    token: Option<String>,
}

impl std::fmt::Debug for KebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KebClient")
            .field("base_url", &self.base_url)
            .field("service_id", &self.service_id)
            .field("plan_id", &self.plan_id)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl KebClient {
    /// Create an unauthenticated client
    pub fn new(settings: &KebSettings) -> Result<Self> {
        Url::parse(&settings.url).map_err(|e| ConfigError::InvalidValue {
            field: "keb.url".to_string(),
            message: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            service_id: settings.service_id.clone(),
            plan_id: settings.plan_id.clone(),
            token: None,
        })
    }

    /// Create a client and obtain a token when OAuth is configured
    pub async fn connect(settings: &KebSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        match &settings.oauth {
            Some(oauth) => {
                let token = client.fetch_token(oauth).await?;
                Ok(client.with_token(token))
            }
            None => Ok(client),
        }
    }

    /// Use a pre-issued bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn fetch_token(&self, oauth: &OAuthSettings) -> Result<String> {
        debug!("Requesting broker token from {}", oauth.token_url);
        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = &oauth.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&oauth.token_url)
            .basic_auth(&oauth.client_id, Some(&oauth.client_secret))
            .form(&form)
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;
        Ok(token.access_token)
    }

    fn osb_url(&self, path: &str) -> String {
        format!("{}/oauth/v2/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        trace!("{} {}", method, url);
        let builder = self
            .http
            .request(method, url)
            .header("X-Broker-API-Version", BROKER_API_VERSION);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Turn a response into `T`, mapping non-success statuses to `CoreError::Api`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(SERVICE, response).await?;
    Ok(response.json().await?)
}

#[async_trait]
impl OperationSource for KebClient {
    async fn operation(
        &self,
        instance_id: &str,
        operation_id: &str,
    ) -> Result<Option<Operation>> {
        let url = self.osb_url(&format!("service_instances/{}/last_operation", instance_id));
        let response = self
            .request(Method::GET, &url)
            .query(&[("operation", operation_id)])
            .send()
            .await?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(None);
        }
        Ok(Some(read_json(response).await?))
    }
}

#[async_trait]
impl BrokerApi for KebClient {
    async fn provision(&self, request: &ProvisionRequest) -> Result<OperationResponse> {
        debug!(
            "Provisioning instance {} with plan {}",
            request.instance_id, request.plan_id
        );
        let url = self.osb_url(&format!("service_instances/{}", request.instance_id));
        let response = self
            .request(Method::PUT, &url)
            .query(&[("accepts_incomplete", "true")])
            .json(&request.to_body(&self.service_id))
            .send()
            .await?;
        read_json(response).await
    }

    async fn update(
        &self,
        instance_id: &str,
        request: &UpdateRequest,
    ) -> Result<OperationResponse> {
        debug!("Updating instance {}", instance_id);
        let url = self.osb_url(&format!("service_instances/{}", instance_id));
        let response = self
            .request(Method::PATCH, &url)
            .query(&[("accepts_incomplete", "true")])
            .json(&request.to_body(&self.service_id))
            .send()
            .await?;
        read_json(response).await
    }

    async fn deprovision(&self, instance_id: &str) -> Result<OperationResponse> {
        debug!("Deprovisioning instance {}", instance_id);
        let url = self.osb_url(&format!("service_instances/{}", instance_id));
        let response = self
            .request(Method::DELETE, &url)
            .query(&[
                ("accepts_incomplete", "true"),
                ("service_id", self.service_id.as_str()),
                ("plan_id", self.plan_id.as_str()),
            ])
            .send()
            .await?;
        read_json(response).await
    }

    async fn runtimes(&self, instance_id: &str) -> Result<RuntimeList> {
        let url = format!("{}/runtimes", self.base_url);
        let response = self
            .request(Method::GET, &url)
            .query(&[("instance_id", instance_id)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn catalog(&self) -> Result<Value> {
        let response = self
            .request(Method::GET, &self.osb_url("catalog"))
            .send()
            .await?;
        read_json(response).await
    }

    async fn kubeconfig(&self, instance_id: &str) -> Result<String> {
        let url = format!("{}/kubeconfig/{}", self.base_url, instance_id);
        let response = self.request(Method::GET, &url).send().await?;
        let response = check_status(SERVICE, response).await?;
        Ok(response.text().await?)
    }
}
