use thiserror::Error;

/// Why a credential was not turned into an identity
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("no credential was presented")]
    MissingCredential,

    /// Looked like a signed token but failed verification. Never retried as a legacy format.
    #[error("signed credential failed verification")]
    MalformedCredential,

    #[error("signed credential has expired")]
    Expired,

    #[error("credential matched no accepted format")]
    UnrecognizedFormat,

    #[error("credential carries no user id")]
    InvalidClaims,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("signing secret unavailable: backing store failed and no default is configured")]
    Unavailable,

    #[error("secret store request timed out after {0}ms")]
    Timeout(u128),

    #[error("secret store request failed: {0}")]
    Request(String),

    #[error("secret store responded with status {0}")]
    Status(u16),

    #[error("failed to decode secret store response: {0}")]
    Decode(String),

    #[error("secret payload has no string field '{0}'")]
    MissingField(String),

    #[error("secret store returned an empty secret")]
    Empty,
}

impl From<reqwest::Error> for SecretError {
    fn from(err: reqwest::Error) -> Self {
        SecretError::Request(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// Caller supplied an incomplete request. Not worth retrying.
    #[error("invalid issuance request: {0}")]
    InvalidRequest(String),

    /// Secret or signing failure. The caller may retry.
    #[error("issuance failed: {0}")]
    Internal(String),
}

impl From<SecretError> for IssuanceError {
    fn from(err: SecretError) -> Self {
        IssuanceError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for IssuanceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        IssuanceError::Internal(format!("signing failed: {err}"))
    }
}

/// Everything that can turn a gateway invocation into a Deny.
///
/// Never leaves [`crate::AuthorizationGateway`]; it exists for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("credential rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("resource identifier '{0}' is not an execute-api method ARN")]
    InvalidResource(String),

    #[error("verification strategy panicked")]
    StrategyPanicked,
}
