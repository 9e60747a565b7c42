//! Access decisions scoped to an API stage.
//!
//! Decisions are widened from the requested `method/path` to the whole stage
//! (`<api-id>/<stage>/*/*`) so that one decision can be cached per credential and
//! reused for every endpoint of that stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::GatewayError;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";
pub const USER_ID_CONTEXT_KEY: &str = "userId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// Parsed `arn:<partition>:execute-api:<region>:<account>:<api-id>/<stage>/<method>/<path...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodArn {
    pub partition: String,
    pub region: String,
    pub account: String,
    pub api_id: String,
    pub stage: String,
    pub method: Option<String>,
    pub path: Option<String>,
}

impl MethodArn {
    pub const SERVICE: &'static str = "execute-api";

    /// Resource covering every method and path of this ARN's stage
    pub fn stage_wildcard(&self) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}/{}/*/*",
            self.partition,
            Self::SERVICE,
            self.region,
            self.account,
            self.api_id,
            self.stage
        )
    }
}

impl FromStr for MethodArn {
    type Err = GatewayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || GatewayError::InvalidResource(raw.to_string());

        let parts: Vec<&str> = raw.splitn(6, ':').collect();
        let &[prefix, partition, service, region, account, resource] = parts.as_slice() else {
            return Err(invalid());
        };
        if prefix != "arn"
            || service != Self::SERVICE
            || [partition, region, account].iter().any(|s| s.is_empty())
        {
            return Err(invalid());
        }

        let mut segments = resource.splitn(4, '/');
        let api_id = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let stage = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let method = segments.next().map(str::to_string);
        let path = segments.next().map(str::to_string);

        Ok(Self {
            partition: partition.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            api_id: api_id.to_string(),
            stage: stage.to_string(),
            method,
            path,
        })
    }
}

/// Outcome of one authorizer invocation.
///
/// Only `Allow` has a context, so a Deny can never leak caller attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow {
        principal_id: String,
        resource_scope: String,
        context: BTreeMap<String, String>,
    },
    Deny {
        principal_id: String,
        resource_scope: String,
    },
}

impl AccessDecision {
    pub fn effect(&self) -> Effect {
        match self {
            Self::Allow { .. } => Effect::Allow,
            Self::Deny { .. } => Effect::Deny,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }

    pub fn principal_id(&self) -> &str {
        match self {
            Self::Allow { principal_id, .. } | Self::Deny { principal_id, .. } => principal_id,
        }
    }

    pub fn resource_scope(&self) -> &str {
        match self {
            Self::Allow { resource_scope, .. } | Self::Deny { resource_scope, .. } => {
                resource_scope
            }
        }
    }

    pub fn context(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Allow { context, .. } => Some(context),
            Self::Deny { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyGenerator;

impl PolicyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Widen `resource_id` to its stage and attach the principal.
    ///
    /// A resource id that is not a method ARN is kept verbatim (`*` when blank); callers
    /// must not Allow against such a resource.
    pub fn generate(&self, principal_id: &str, effect: Effect, resource_id: &str) -> AccessDecision {
        let resource_scope = Self::scope(resource_id);
        match effect {
            Effect::Allow => AccessDecision::Allow {
                principal_id: principal_id.to_string(),
                resource_scope,
                context: BTreeMap::from([(
                    USER_ID_CONTEXT_KEY.to_string(),
                    principal_id.to_string(),
                )]),
            },
            Effect::Deny => AccessDecision::Deny {
                principal_id: principal_id.to_string(),
                resource_scope,
            },
        }
    }

    /// Stage-wide resource for `resource_id`
    pub fn scope(resource_id: &str) -> String {
        match resource_id.parse::<MethodArn>() {
            Ok(arn) => arn.stage_wildcard(),
            Err(_) if resource_id.trim().is_empty() => "*".to_string(),
            Err(_) => resource_id.to_string(),
        }
    }
}
