//! Signing secret resolution.
//!
//! The secret lives in a secure backing store reached through a [`SecretProvider`].
//! [`SecretStore`] memoizes the first value it resolves for the lifetime of the
//! process. When the store cannot be reached it falls back to a statically
//! configured default, which is then memoized the same way.

use crate::error::SecretError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Where a resolved secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Store,
    Default,
}

/// Signing key material plus the time it was fetched
#[derive(Clone)]
pub struct Secret {
    key: Arc<[u8]>,
    fetched_at: DateTime<Utc>,
    source: SecretSource,
}

impl Secret {
    pub fn new(value: impl AsRef<[u8]>, source: SecretSource) -> Self {
        Self {
            key: Arc::from(value.as_ref()),
            fetched_at: Utc::now(),
            source,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn source(&self) -> SecretSource {
        self.source
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("key", &"<redacted>")
            .field("fetched_at", &self.fetched_at)
            .field("source", &self.source)
            .finish()
    }
}

/// Capability to fetch the raw signing secret from a backing store
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn fetch(&self) -> Result<String, SecretError>;
}

/// Provider that always returns the same value
#[derive(Clone)]
pub struct StaticSecretProvider {
    value: String,
}

impl StaticSecretProvider {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn fetch(&self) -> Result<String, SecretError> {
        if self.value.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(self.value.clone())
    }
}

/// GetSecretValue response body, only the field we read
#[derive(Debug, Deserialize)]
struct GetSecretValueResponse {
    #[serde(rename = "SecretString")]
    secret_string: Option<String>,
}

/// Reads the secret through the AWS Parameters and Secrets extension HTTP interface.
///
/// `SecretString` is either the key itself or a JSON object holding it under `field`.
#[derive(Clone, Debug)]
pub struct ExtensionSecretProvider {
    client: Client,
    endpoint: Url,
    secret_id: String,
    field: Option<String>,
    session_token: Option<String>,
}

impl ExtensionSecretProvider {
    pub const TOKEN_HEADER: &'static str = "X-Aws-Parameters-Secrets-Token";

    pub fn new(
        endpoint: Url,
        secret_id: impl Into<String>,
        field: Option<String>,
        session_token: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(1))
            .pool_max_idle_per_host(2)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint,
            secret_id: secret_id.into(),
            field: field.filter(|f| !f.is_empty()),
            session_token: session_token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl SecretProvider for ExtensionSecretProvider {
    async fn fetch(&self) -> Result<String, SecretError> {
        let url = self
            .endpoint
            .join("/secretsmanager/get")
            .map_err(|e| SecretError::Request(e.to_string()))?;

        let mut request = self
            .client
            .get(url)
            .query(&[("secretId", self.secret_id.as_str())]);
        if let Some(token) = &self.session_token {
            request = request.header(Self::TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SecretError::Status(status.as_u16()));
        }

        let body: GetSecretValueResponse = response
            .json()
            .await
            .map_err(|e| SecretError::Decode(e.to_string()))?;
        let raw = body
            .secret_string
            .ok_or_else(|| SecretError::MissingField("SecretString".to_string()))?;

        extract_secret(raw, self.field.as_deref())
    }
}

/// Pick the signing key out of a `SecretString`.
///
/// A JSON object is searched for `field`; anything else is taken verbatim.
fn extract_secret(raw: String, field: Option<&str>) -> Result<String, SecretError> {
    let value = match (field, serde_json::from_str::<serde_json::Value>(&raw)) {
        (Some(field), Ok(serde_json::Value::Object(map))) => map
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| SecretError::MissingField(field.to_string()))?,
        _ => raw,
    };

    if value.is_empty() {
        return Err(SecretError::Empty);
    }
    Ok(value)
}

/// Resolves the signing secret, memoizing the first successful resolution.
pub struct SecretStore {
    provider: Option<Arc<dyn SecretProvider>>,
    default: Option<String>,
    timeout: Duration,
    resolved: OnceCell<Secret>,
}

impl SecretStore {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(provider: Option<Arc<dyn SecretProvider>>, default: Option<String>) -> Self {
        Self {
            provider,
            default: default.filter(|d| !d.is_empty()),
            timeout: Self::DEFAULT_TIMEOUT,
            resolved: OnceCell::new(),
        }
    }

    /// Store without a backing provider, always answering with `secret`
    pub fn from_default(secret: impl Into<String>) -> Self {
        Self::new(None, Some(secret.into()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether any source for the secret is configured at all
    pub fn is_configured(&self) -> bool {
        self.provider.is_some() || self.default.is_some()
    }

    pub async fn resolve(&self) -> Result<Secret, SecretError> {
        if let Some(secret) = self.resolved.get() {
            return Ok(secret.clone());
        }

        if let Some(provider) = &self.provider {
            match self.fetch_from_store(provider.as_ref()).await {
                Ok(secret) => {
                    // Concurrent resolutions may race here; every winner holds the same value.
                    let _ = self.resolved.set(secret.clone());
                    debug!("Signing secret resolved from backing store");
                    return Ok(secret);
                }
                Err(e) if self.default.is_some() => {
                    warn!("Secret store unavailable, running in degraded mode with default secret: {e}");
                }
                Err(e) => {
                    error!("Secret store unavailable and no default secret configured: {e}");
                }
            }
        }

        let value = self.default.as_ref().ok_or(SecretError::Unavailable)?;
        let secret = Secret::new(value, SecretSource::Default);
        // Degraded mode sticks for the lifetime of the store, like a store-resolved value.
        let _ = self.resolved.set(secret.clone());
        Ok(secret)
    }

    async fn fetch_from_store(&self, provider: &dyn SecretProvider) -> Result<Secret, SecretError> {
        let value = tokio::time::timeout(self.timeout, provider.fetch())
            .await
            .map_err(|_| SecretError::Timeout(self.timeout.as_millis()))??;
        if value.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(Secret::new(value, SecretSource::Store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingProvider {
        calls: AtomicUsize,
        result: Result<String, SecretError>,
    }

    impl CountingProvider {
        fn new(result: Result<String, SecretError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretProvider for CountingProvider {
        async fn fetch(&self) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl SecretProvider for HangingProvider {
        async fn fetch(&self) -> Result<String, SecretError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too-late".to_string())
        }
    }

    #[tokio::test]
    async fn test_store_value_is_memoized() {
        let provider = CountingProvider::new(Ok("from-store".to_string()));
        let store = SecretStore::new(Some(provider.clone()), Some("fallback".to_string()));

        let first = store.resolve().await.unwrap();
        let second = store.resolve().await.unwrap();

        assert_eq!(first.as_bytes(), b"from-store");
        assert_eq!(first.source(), SecretSource::Store);
        assert_eq!(second.as_bytes(), b"from-store");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_default_fallback_is_memoized() {
        let provider = CountingProvider::new(Err(SecretError::Status(500)));
        let store = SecretStore::new(Some(provider.clone()), Some("fallback".to_string()));

        for _ in 0..3 {
            let secret = store.resolve().await.unwrap();
            assert_eq!(secret.as_bytes(), b"fallback");
            assert_eq!(secret.source(), SecretSource::Default);
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_mode_pays_store_timeout_once() {
        let store = SecretStore::new(Some(Arc::new(HangingProvider)), Some("fallback".to_string()))
            .with_timeout(Duration::from_millis(300));

        let started = tokio::time::Instant::now();
        store.resolve().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));

        let started = tokio::time::Instant::now();
        for _ in 0..3 {
            assert_eq!(store.resolve().await.unwrap().source(), SecretSource::Default);
        }
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_unavailable_is_not_memoized() {
        let provider = CountingProvider::new(Err(SecretError::Status(500)));
        let store = SecretStore::new(Some(provider.clone()), None);

        assert!(store.resolve().await.is_err());
        assert!(store.resolve().await.is_err());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_without_default() {
        let provider = CountingProvider::new(Err(SecretError::Request("refused".to_string())));
        let store = SecretStore::new(Some(provider), None);

        assert_eq!(store.resolve().await.unwrap_err(), SecretError::Unavailable);
    }

    #[tokio::test]
    async fn test_nothing_configured_is_unavailable() {
        let store = SecretStore::new(None, Some(String::new()));
        assert!(!store.is_configured());
        assert_eq!(store.resolve().await.unwrap_err(), SecretError::Unavailable);
    }

    #[tokio::test]
    async fn test_empty_store_value_is_a_failure() {
        let provider = CountingProvider::new(Ok(String::new()));
        let store = SecretStore::new(Some(provider), Some("fallback".to_string()));

        let secret = store.resolve().await.unwrap();
        assert_eq!(secret.source(), SecretSource::Default);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_treated_as_retrieval_error() {
        let store = SecretStore::new(Some(Arc::new(HangingProvider)), Some("fallback".to_string()))
            .with_timeout(Duration::from_millis(250));

        let secret = store.resolve().await.unwrap();
        assert_eq!(secret.as_bytes(), b"fallback");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_default_is_unavailable() {
        let store = SecretStore::new(Some(Arc::new(HangingProvider)), None)
            .with_timeout(Duration::from_millis(250));

        assert_eq!(store.resolve().await.unwrap_err(), SecretError::Unavailable);
    }

    #[test]
    fn test_debug_redacts_key() {
        let secret = Secret::new("super-secret", SecretSource::Default);
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_extract_secret_from_json_field() {
        let raw = r#"{"JWT_SECRET":"abc","OTHER":"x"}"#.to_string();
        assert_eq!(extract_secret(raw, Some("JWT_SECRET")).unwrap(), "abc");
    }

    #[test]
    fn test_extract_secret_missing_field() {
        let raw = r#"{"OTHER":"x"}"#.to_string();
        assert_eq!(
            extract_secret(raw, Some("JWT_SECRET")).unwrap_err(),
            SecretError::MissingField("JWT_SECRET".to_string())
        );
    }

    #[test]
    fn test_extract_secret_plain_string() {
        assert_eq!(
            extract_secret("plain-key".to_string(), Some("JWT_SECRET")).unwrap(),
            "plain-key"
        );
    }

    #[tokio::test]
    async fn test_extension_provider_fetches_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secretsmanager/get"))
            .and(query_param("secretId", "app/jwt"))
            .and(header(ExtensionSecretProvider::TOKEN_HEADER, "session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Name": "app/jwt",
                "SecretString": "{\"JWT_SECRET\":\"s3cret\"}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ExtensionSecretProvider::new(
            Url::parse(&server.uri()).unwrap(),
            "app/jwt",
            Some("JWT_SECRET".to_string()),
            Some("session-token".to_string()),
        );

        assert_eq!(provider.fetch().await.unwrap(), "s3cret");
    }

    #[tokio::test]
    async fn test_extension_provider_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secretsmanager/get"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let provider = ExtensionSecretProvider::new(
            Url::parse(&server.uri()).unwrap(),
            "app/jwt",
            None,
            None,
        );

        assert_eq!(provider.fetch().await.unwrap_err(), SecretError::Status(403));
    }
}
