//! Backing secret store configuration

use super::ConfigError;
use confique::Config;
use std::time::Duration;
use url::Url;

/// Fallback env var for the extension session token, set by the Lambda runtime
pub const AWS_SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Secrets extension (local HTTP interface) configuration
#[derive(Debug, Config, Clone)]
pub struct SecretStoreConfig {
    /// Read the signing secret from the secrets extension (default: false)
    #[config(env = "AUTHZ_SECRET_STORE_ENABLED", default = false)]
    pub enabled: bool,

    /// Base URL of the secrets extension (default: http://localhost:2773)
    #[config(env = "AUTHZ_SECRET_STORE_ENDPOINT", default = "http://localhost:2773")]
    pub endpoint: String,

    /// Secret identifier (default: fitness-app/jwt-secret)
    #[config(env = "AUTHZ_SECRET_STORE_SECRET_ID", default = "fitness-app/jwt-secret")]
    pub secret_id: String,

    /// JSON field holding the key. Empty means the secret string is the key itself.
    #[config(env = "AUTHZ_SECRET_STORE_FIELD", default = "JWT_SECRET")]
    pub field: String,

    /// Session token sent to the extension, falls back to `AWS_SESSION_TOKEN`
    #[config(env = "AUTHZ_SECRET_STORE_TOKEN")]
    pub session_token: Option<String>,

    /// Per-fetch timeout in seconds (default: 3)
    #[config(env = "AUTHZ_SECRET_STORE_TIMEOUT", default = 3)]
    pub timeout: u64,
}

impl SecretStoreConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    pub fn field(&self) -> Option<String> {
        Some(self.field.trim().to_string()).filter(|f| !f.is_empty())
    }

    pub fn session_token(&self) -> Option<String> {
        self.session_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(AWS_SESSION_TOKEN_ENV).ok())
            .filter(|t| !t.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
