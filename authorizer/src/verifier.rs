//! Credential verification.
//!
//! A credential that looks like a signed token (three non-empty dot-separated
//! segments) is verified by [`SignedTokenStrategy`] and nothing else. Every other
//! credential walks the ordered legacy strategies until one accepts it.

use crate::claims::{Claims, CredentialKind, Identity};
use crate::error::RejectReason;
use crate::secret::Secret;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use log::debug;
use serde::Deserialize;

/// The single algorithm credentials are signed with
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Shortest raw string accepted as a literal user id
pub const LITERAL_MIN_LEN: usize = 10;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// One accepted credential format
pub trait CredentialStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, credential: &str, secret: &Secret) -> Result<Identity, RejectReason>;
}

/// Removes a leading, case-insensitive `Bearer ` marker and surrounding whitespace
pub fn strip_bearer_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("bearer") {
        return "";
    }
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

/// Exactly three non-empty dot-separated segments
pub fn looks_like_signed_token(credential: &str) -> bool {
    let segments: Vec<&str> = credential.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

/// HS256 signature and expiry check
#[derive(Debug, Clone)]
pub struct SignedTokenStrategy {
    leeway: u64,
}

impl SignedTokenStrategy {
    pub fn new(leeway: u64) -> Self {
        Self { leeway }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = self.leeway;
        validation
    }
}

impl Default for SignedTokenStrategy {
    fn default() -> Self {
        Self::new(60)
    }
}

impl CredentialStrategy for SignedTokenStrategy {
    fn name(&self) -> &'static str {
        "signed"
    }

    fn verify(&self, credential: &str, secret: &Secret) -> Result<Identity, RejectReason> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        match jsonwebtoken::decode::<Claims>(credential, &key, &self.validation()) {
            Ok(data) => Ok(Identity::signed(&data.claims)),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(RejectReason::Expired),
                _ => {
                    debug!("Signed credential failed verification: {e}");
                    Err(RejectReason::MalformedCredential)
                }
            },
        }
    }
}

#[derive(Deserialize)]
struct LegacyPayload {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Base64-encoded JSON object carrying a `userId` string
#[derive(Debug, Clone, Default)]
pub struct LegacyEncodedStrategy;

impl CredentialStrategy for LegacyEncodedStrategy {
    fn name(&self) -> &'static str {
        "legacy-encoded"
    }

    fn verify(&self, credential: &str, _secret: &Secret) -> Result<Identity, RejectReason> {
        let bytes = STANDARD_LENIENT
            .decode(credential)
            .or_else(|_| URL_SAFE_LENIENT.decode(credential))
            .map_err(|_| RejectReason::UnrecognizedFormat)?;
        let payload: LegacyPayload =
            serde_json::from_slice(&bytes).map_err(|_| RejectReason::UnrecognizedFormat)?;
        Ok(Identity::legacy(payload.user_id, CredentialKind::LegacyEncoded))
    }
}

/// The credential itself is the user id.
///
/// Any caller holding an opaque string of [`LITERAL_MIN_LEN`] characters passes this
/// check. It exists for clients that predate signed credentials and can be turned off
/// with [`TokenVerifier::new`]'s `allow_literal` switch.
#[derive(Debug, Clone)]
pub struct LegacyLiteralStrategy {
    min_len: usize,
}

impl Default for LegacyLiteralStrategy {
    fn default() -> Self {
        Self {
            min_len: LITERAL_MIN_LEN,
        }
    }
}

impl CredentialStrategy for LegacyLiteralStrategy {
    fn name(&self) -> &'static str {
        "legacy-literal"
    }

    fn verify(&self, credential: &str, _secret: &Secret) -> Result<Identity, RejectReason> {
        if looks_like_signed_token(credential) || credential.chars().count() < self.min_len {
            return Err(RejectReason::UnrecognizedFormat);
        }
        Ok(Identity::legacy(credential, CredentialKind::LegacyLiteral))
    }
}

/// Ordered chain of accepted credential formats
pub struct TokenVerifier {
    signed: SignedTokenStrategy,
    legacy: Vec<Box<dyn CredentialStrategy>>,
}

impl TokenVerifier {
    pub fn new(leeway: u64, allow_literal: bool) -> Self {
        let mut legacy: Vec<Box<dyn CredentialStrategy>> = vec![Box::new(LegacyEncodedStrategy)];
        if allow_literal {
            legacy.push(Box::new(LegacyLiteralStrategy::default()));
        }
        Self::with_strategies(SignedTokenStrategy::new(leeway), legacy)
    }

    pub fn with_strategies(
        signed: SignedTokenStrategy,
        legacy: Vec<Box<dyn CredentialStrategy>>,
    ) -> Self {
        Self { signed, legacy }
    }

    pub fn verify(&self, raw: &str, secret: &Secret) -> Result<Identity, RejectReason> {
        let credential = strip_bearer_prefix(raw);
        if credential.is_empty() {
            return Err(RejectReason::MissingCredential);
        }

        let identity = if looks_like_signed_token(credential) {
            // Terminal: the legacy strategies never see a signed-looking credential.
            self.signed.verify(credential, secret)?
        } else {
            self.verify_legacy(credential, secret)?
        };

        if identity.user_id.trim().is_empty() {
            return Err(RejectReason::InvalidClaims);
        }
        Ok(identity)
    }

    fn verify_legacy(&self, credential: &str, secret: &Secret) -> Result<Identity, RejectReason> {
        for strategy in &self.legacy {
            match strategy.verify(credential, secret) {
                Ok(identity) => {
                    debug!("Credential accepted by '{}' strategy", strategy.name());
                    return Ok(identity);
                }
                Err(reason) => {
                    debug!("Credential strategy '{}' declined: {reason}", strategy.name());
                }
            }
        }
        Err(RejectReason::UnrecognizedFormat)
    }
}

impl Default for TokenVerifier {
    fn default() -> Self {
        Self::new(60, true)
    }
}
