//! Assertions about provisioned runtimes

use crate::error::{CoreError, Result};
use crate::gardener::ShootInfo;
use crate::keb::KYMA_SERVICE_ID;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OIDC settings of a shoot's kube-apiserver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "issuerURL")]
    pub issuer_url: String,
    #[serde(default)]
    pub groups_claim: String,
    #[serde(default)]
    pub username_claim: String,
    #[serde(default)]
    pub username_prefix: String,
    #[serde(default)]
    pub signing_algs: Vec<String>,
}

/// Require every OIDC field of the shoot to equal `expected`
///
/// All mismatching fields are reported together.
pub fn ensure_valid_shoot_oidc_config(shoot: &ShootInfo, expected: &OidcConfig) -> Result<()> {
    let Some(actual) = &shoot.oidc_config else {
        return Err(CoreError::Validation(format!(
            "shoot {} has no OIDC configuration",
            shoot.name
        )));
    };

    let mut mismatches = Vec::new();
    let mut check = |field: &str, actual: &str, expected: &str| {
        if actual != expected {
            mismatches.push(format!("{field}: expected {expected:?}, got {actual:?}"));
        }
    };
    check("clientID", &actual.client_id, &expected.client_id);
    check("issuerURL", &actual.issuer_url, &expected.issuer_url);
    check("groupsClaim", &actual.groups_claim, &expected.groups_claim);
    check("usernameClaim", &actual.username_claim, &expected.username_claim);
    check("usernamePrefix", &actual.username_prefix, &expected.username_prefix);
    if actual.signing_algs != expected.signing_algs {
        mismatches.push(format!(
            "signingAlgs: expected {:?}, got {:?}",
            expected.signing_algs, actual.signing_algs
        ));
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "OIDC configuration of shoot {} does not match:\n  {}",
            shoot.name,
            mismatches.join("\n  ")
        )))
    }
}

/// Require the issuer URL and client ID to appear as whole tokens in a kubeconfig
pub fn ensure_kubeconfig_mentions_oidc(kubeconfig: &str, expected: &OidcConfig) -> Result<()> {
    for (field, value) in [
        ("issuer URL", &expected.issuer_url),
        ("client ID", &expected.client_id),
    ] {
        if !contains_token(kubeconfig, value)? {
            return Err(CoreError::Validation(format!(
                "kubeconfig does not contain the expected {field} {value}"
            )));
        }
    }
    Ok(())
}

/// Word-bounded literal match
///
/// `\b` is only placed next to word characters, otherwise an issuer URL
/// ending in `/` could never match.
fn contains_token(haystack: &str, token: &str) -> Result<bool> {
    if token.is_empty() {
        return Ok(false);
    }
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let mut pattern = String::new();
    if is_word(token.chars().next()) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(token));
    if is_word(token.chars().last()) {
        pattern.push_str(r"\b");
    }
    let re = Regex::new(&pattern)
        .map_err(|e| CoreError::Validation(format!("invalid match pattern: {e}")))?;
    Ok(re.is_match(haystack))
}

/// Machine types a plan accepts on update, in catalog order
pub fn supported_machine_types(catalog: &Value, plan_id: &str) -> Result<Vec<String>> {
    let plan = catalog
        .get("services")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Validation("catalog has no services".to_string()))?
        .iter()
        .find(|service| service.get("id").and_then(Value::as_str) == Some(KYMA_SERVICE_ID))
        .ok_or_else(|| CoreError::Validation("catalog has no Kyma service".to_string()))?
        .get("plans")
        .and_then(Value::as_array)
        .and_then(|plans| {
            plans
                .iter()
                .find(|plan| plan.get("id").and_then(Value::as_str) == Some(plan_id))
        })
        .ok_or_else(|| CoreError::Validation(format!("plan {plan_id} not found in catalog")))?;

    let values = plan
        .pointer("/schemas/service_instance/update/parameters/properties/machineType/enum")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "plan {plan_id} does not allow updating the machine type"
            ))
        })?;

    Ok(values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

/// The machine type after `current`, wrapping around
///
/// `None` when there is nothing to switch to or `current` is not listed.
pub fn next_machine_type(machine_types: &[String], current: &str) -> Option<String> {
    if machine_types.len() < 2 {
        return None;
    }
    let index = machine_types.iter().position(|m| m == current)?;
    Some(machine_types[(index + 1) % machine_types.len()].clone())
}
