use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims embedded in a signed credential.
///
/// Timestamps are seconds since the Unix epoch, the form `jsonwebtoken` validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Format a credential was accepted through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Signed,
    LegacyEncoded,
    LegacyLiteral,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signed => "signed",
            Self::LegacyEncoded => "legacy-encoded",
            Self::LegacyLiteral => "legacy-literal",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity established by the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    /// Only signed credentials carry an issuance time.
    pub issued_at: Option<DateTime<Utc>>,
    /// Legacy credentials never expire.
    pub expires_at: Option<DateTime<Utc>>,
    pub kind: CredentialKind,
}

impl Identity {
    pub fn signed(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            kind: CredentialKind::Signed,
        }
    }

    pub fn legacy(user_id: impl Into<String>, kind: CredentialKind) -> Self {
        Self {
            user_id: user_id.into(),
            issued_at: None,
            expires_at: None,
            kind,
        }
    }
}
