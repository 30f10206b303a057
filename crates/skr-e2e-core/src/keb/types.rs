//! Request and response bodies for the broker API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Service ID of the Kyma offering in the broker catalog
pub const KYMA_SERVICE_ID: &str = "47c9dcbf-ff30-448e-ab36-d3bad66ba281";

/// Broker API version sent with every OSB request
pub const BROKER_API_VERSION: &str = "2.14";

/// Account identity placed into the OSB `context`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformContext {
    #[serde(rename = "globalaccount_id")]
    pub global_account_id: String,
    pub subaccount_id: String,
    pub user_id: String,
}

/// Service Manager credentials handed to the BTP operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtpOperatorCredentials {
    #[serde(rename = "clientid")]
    pub client_id: String,
    #[serde(rename = "clientsecret")]
    pub client_secret: String,
    #[serde(rename = "sm_url")]
    pub sm_url: String,
    #[serde(rename = "url")]
    pub token_url: String,
}

impl BtpOperatorCredentials {
    /// Placeholder credentials for runtimes that never talk to Service Manager
    pub fn dummy() -> Self {
        Self {
            client_id: "dummy_client_id".to_string(),
            client_secret: "dummy_client_secret".to_string(),
            sm_url: "dummy_url".to_string(),
            token_url: "dummy_token_url".to_string(),
        }
    }
}

/// Provisioning request for a new runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    pub instance_id: String,
    pub plan_id: String,
    pub name: String,
    pub region: String,
    pub platform: PlatformContext,
    pub btp_operator_credentials: Option<BtpOperatorCredentials>,
    /// Extra plan parameters merged into `parameters`
    pub custom_parameters: Map<String, Value>,
}

impl ProvisionRequest {
    pub fn new(
        instance_id: impl Into<String>,
        plan_id: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            plan_id: plan_id.into(),
            name: name.into(),
            region: region.into(),
            platform: PlatformContext::default(),
            btp_operator_credentials: None,
            custom_parameters: Map::new(),
        }
    }

    pub fn platform(mut self, platform: PlatformContext) -> Self {
        self.platform = platform;
        self
    }

    pub fn btp_operator_credentials(mut self, credentials: BtpOperatorCredentials) -> Self {
        self.btp_operator_credentials = Some(credentials);
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_parameters.insert(key.into(), value.into());
        self
    }

    /// OSB body for `PUT /service_instances/{id}`
    pub fn to_body(&self, service_id: &str) -> Value {
        let mut parameters = Map::new();
        parameters.insert("name".to_string(), Value::from(self.name.clone()));
        parameters.insert("region".to_string(), Value::from(self.region.clone()));
        for (key, value) in &self.custom_parameters {
            parameters.insert(key.clone(), value.clone());
        }

        serde_json::json!({
            "service_id": service_id,
            "plan_id": self.plan_id,
            "context": context_body(&self.platform, self.btp_operator_credentials.as_ref(), None),
            "parameters": parameters,
        })
    }
}

/// Update request for an existing runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub platform: PlatformContext,
    pub custom_parameters: Map<String, Value>,
    pub btp_operator_credentials: Option<BtpOperatorCredentials>,
    pub is_migration: bool,
}

impl UpdateRequest {
    pub fn new(platform: PlatformContext) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_parameters.insert(key.into(), value.into());
        self
    }

    pub fn btp_operator_credentials(mut self, credentials: BtpOperatorCredentials) -> Self {
        self.btp_operator_credentials = Some(credentials);
        self
    }

    pub fn migration(mut self, is_migration: bool) -> Self {
        self.is_migration = is_migration;
        self
    }

    /// OSB body for `PATCH /service_instances/{id}`
    pub fn to_body(&self, service_id: &str) -> Value {
        serde_json::json!({
            "service_id": service_id,
            "context": context_body(
                &self.platform,
                self.btp_operator_credentials.as_ref(),
                Some(self.is_migration),
            ),
            "parameters": self.custom_parameters,
        })
    }
}

fn context_body(
    platform: &PlatformContext,
    credentials: Option<&BtpOperatorCredentials>,
    is_migration: Option<bool>,
) -> Value {
    let mut context = match serde_json::to_value(platform) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(creds) = credentials
        && let Ok(value) = serde_json::to_value(creds)
    {
        context.insert("sm_operator_credentials".to_string(), value);
    }
    if let Some(flag) = is_migration {
        context.insert("isMigration".to_string(), Value::Bool(flag));
    }
    Value::Object(context)
}

/// Response of `GET /runtimes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeList {
    #[serde(default)]
    pub data: Vec<RuntimeInfo>,
    #[serde(default)]
    pub count: usize,
    #[serde(default, rename = "totalCount")]
    pub total_count: usize,
}

/// A runtime entry as reported by the broker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    #[serde(rename = "instanceID", default)]
    pub instance_id: String,
    #[serde(rename = "runtimeID", default)]
    pub runtime_id: String,
    #[serde(default)]
    pub shoot_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "planID", default)]
    pub plan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn platform() -> PlatformContext {
        PlatformContext {
            global_account_id: "ga".to_string(),
            subaccount_id: "sa".to_string(),
            user_id: "user@example.com".to_string(),
        }
    }

    #[test]
    fn test_provision_body_merges_custom_parameters() {
        let body = ProvisionRequest::new("inst", "plan", "e2e-runtime", "eu-central-1")
            .platform(platform())
            .btp_operator_credentials(BtpOperatorCredentials::dummy())
            .parameter("machineType", "m6i.large")
            .to_body(KYMA_SERVICE_ID);

        assert_eq!(body["service_id"], KYMA_SERVICE_ID);
        assert_eq!(body["plan_id"], "plan");
        assert_eq!(body["parameters"]["name"], "e2e-runtime");
        assert_eq!(body["parameters"]["region"], "eu-central-1");
        assert_eq!(body["parameters"]["machineType"], "m6i.large");
        assert_eq!(body["context"]["globalaccount_id"], "ga");
        assert_eq!(
            body["context"]["sm_operator_credentials"]["clientid"],
            "dummy_client_id"
        );
        assert!(body["context"].get("isMigration").is_none());
    }

    #[test]
    fn test_update_body_carries_migration_flag() {
        let body = UpdateRequest::new(platform())
            .parameter("administrators", json!(["admin@example.com"]))
            .migration(true)
            .to_body(KYMA_SERVICE_ID);

        assert_eq!(body["context"]["isMigration"], true);
        assert_eq!(body["parameters"]["administrators"][0], "admin@example.com");
        assert!(body["context"].get("sm_operator_credentials").is_none());
        assert!(body.get("plan_id").is_none());
    }

    #[test]
    fn test_runtime_list_parses_shoot_name() {
        let list: RuntimeList = serde_json::from_value(json!({
            "data": [{"instanceID": "inst", "shootName": "c-123abc", "region": "eu"}],
            "count": 1,
            "totalCount": 1
        }))
        .unwrap();

        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].shoot_name, "c-123abc");
        assert_eq!(list.data[0].instance_id, "inst");
    }
}
