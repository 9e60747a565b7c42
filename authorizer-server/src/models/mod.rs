use authorizer::policy::{INVOKE_ACTION, POLICY_VERSION};
use authorizer::{AccessDecision, IssuedCredential};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Token authorizer event
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
pub struct AuthorizerRequest {
    /// Event type, `TOKEN` for token authorizers
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Raw credential, optionally prefixed with `Bearer`
    #[serde(rename = "authorizationToken", default)]
    pub authorization_token: Option<String>,
    /// Method ARN of the invoked endpoint
    #[serde(rename = "methodArn", default)]
    pub method_arn: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    /// Present on Allow only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    /// `Allow` or `Deny`
    pub effect: String,
    pub resource: String,
}

impl From<&AccessDecision> for AuthorizerResponse {
    fn from(decision: &AccessDecision) -> Self {
        Self {
            principal_id: decision.principal_id().to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![PolicyStatement {
                    action: INVOKE_ACTION.to_string(),
                    effect: decision.effect().as_str().to_string(),
                    resource: decision.resource_scope().to_string(),
                }],
            },
            context: decision.context().cloned(),
        }
    }
}

/// Credential issuance request. The identity proof has already been checked upstream.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Opaque identity proof
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Validity window, e.g. `7d`
    pub expires_in: String,
}

impl From<IssuedCredential> for TokenResponse {
    fn from(issued: IssuedCredential) -> Self {
        Self {
            expires_in: issued.expires_in(),
            token: issued.token,
        }
    }
}
