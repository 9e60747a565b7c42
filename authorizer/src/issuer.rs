//! Credential issuance for identities proven upstream.
//!
//! The identity proof (e.g. an Apple identity token) is validated before it reaches
//! this module; issuance only requires that one was supplied.

use crate::claims::Claims;
use crate::error::IssuanceError;
use crate::secret::SecretStore;
use crate::verifier::SIGNING_ALGORITHM;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use log::{debug, info};
use std::sync::Arc;

/// Validity window of every issued credential
pub const TOKEN_VALIDITY_DAYS: i64 = 7;

/// A freshly minted credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedCredential {
    /// Validity window in the short form clients expect, e.g. `7d`
    pub fn expires_in(&self) -> String {
        format!("{}d", (self.expires_at - self.issued_at).num_days())
    }
}

pub struct TokenIssuer {
    secrets: Arc<SecretStore>,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(secrets: Arc<SecretStore>) -> Self {
        Self {
            secrets,
            validity: Duration::days(TOKEN_VALIDITY_DAYS),
        }
    }

    pub async fn issue(
        &self,
        user_id: &str,
        proof: Option<&str>,
    ) -> Result<IssuedCredential, IssuanceError> {
        self.issue_at(user_id, proof, Utc::now()).await
    }

    /// Issue a credential as if it were minted at `issued_at`
    #[doc(hidden)]
    pub async fn issue_at(
        &self,
        user_id: &str,
        proof: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedCredential, IssuanceError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(IssuanceError::InvalidRequest("userId is required".to_string()));
        }
        if proof.is_none_or(|p| p.trim().is_empty()) {
            return Err(IssuanceError::InvalidRequest("authToken is required".to_string()));
        }

        let secret = self.secrets.resolve().await?;
        let expires_at = issued_at + self.validity;
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        debug!("Signed credential with secret from {:?}", secret.source());
        info!("Issued credential for user '{user_id}', expires at {expires_at}");

        Ok(IssuedCredential {
            token,
            issued_at,
            expires_at,
        })
    }
}
