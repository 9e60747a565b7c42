use crate::claims::Identity;
use crate::error::GatewayError;
use crate::policy::{AccessDecision, Effect, MethodArn, PolicyGenerator};
use crate::secret::SecretStore;
use crate::verifier::TokenVerifier;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Principal reported on every Deny
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Per-request authorizer.
///
/// Fails closed: every rejection or internal failure, including a panicking
/// verification strategy, becomes a Deny decision.
pub struct AuthorizationGateway {
    secrets: Arc<SecretStore>,
    verifier: TokenVerifier,
    policy: PolicyGenerator,
}

impl AuthorizationGateway {
    pub fn new(secrets: Arc<SecretStore>, verifier: TokenVerifier) -> Self {
        Self {
            secrets,
            verifier,
            policy: PolicyGenerator::new(),
        }
    }

    pub async fn authorize(&self, raw_credential: &str, resource_id: &str) -> AccessDecision {
        self.authorize_with_expiry(raw_credential, resource_id)
            .await
            .0
    }

    /// Like [`Self::authorize`], also returning when the verified credential expires.
    ///
    /// The expiry is `None` for Deny decisions and for credentials without a lifetime.
    pub async fn authorize_with_expiry(
        &self,
        raw_credential: &str,
        resource_id: &str,
    ) -> (AccessDecision, Option<DateTime<Utc>>) {
        match self.evaluate(raw_credential, resource_id).await {
            Ok(identity) => {
                debug!(
                    "Allowing user '{}' ({} credential)",
                    identity.user_id, identity.kind
                );
                let decision = self
                    .policy
                    .generate(&identity.user_id, Effect::Allow, resource_id);
                (decision, identity.expires_at)
            }
            Err(err) => {
                match &err {
                    GatewayError::Rejected(_) => info!("Denying request: {err}"),
                    _ => warn!("Denying request after internal failure: {err}"),
                }
                let decision = self
                    .policy
                    .generate(ANONYMOUS_PRINCIPAL, Effect::Deny, resource_id);
                (decision, None)
            }
        }
    }

    /// Verification outcome behind [`Self::authorize`]
    pub async fn evaluate(
        &self,
        raw_credential: &str,
        resource_id: &str,
    ) -> Result<Identity, GatewayError> {
        resource_id.parse::<MethodArn>()?;
        let secret = self.secrets.resolve().await?;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.verifier.verify(raw_credential, &secret)
        }))
        .map_err(|_| GatewayError::StrategyPanicked)?;

        Ok(outcome?)
    }
}
