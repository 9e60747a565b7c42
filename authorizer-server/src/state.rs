use crate::cache::DecisionCache;
use crate::config::{ConfigError, Settings};
use authorizer::{
    AuthorizationGateway, ExtensionSecretProvider, Secret, SecretError, SecretProvider,
    SecretStore, TokenIssuer, TokenVerifier,
};
use log::info;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub secrets: Arc<SecretStore>,
    pub gateway: Arc<AuthorizationGateway>,
    pub issuer: Arc<TokenIssuer>,
    pub decisions: DecisionCache,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let secrets = Self::create_secret_store(&settings)?;
        Ok(Self::with_secret_store(settings, secrets))
    }

    fn create_secret_store(settings: &Settings) -> Result<SecretStore, ConfigError> {
        let store = &settings.secret_store;
        let provider: Option<Arc<dyn SecretProvider>> = if store.enabled {
            let endpoint = store.endpoint_url()?;
            info!(
                "Reading signing secret '{}' from secret store at {}",
                store.secret_id, endpoint
            );
            Some(Arc::new(ExtensionSecretProvider::new(
                endpoint,
                store.secret_id.clone(),
                store.field(),
                store.session_token(),
            )))
        } else {
            None
        };

        let secrets = SecretStore::new(provider, settings.default_secret())
            .with_timeout(store.timeout());
        if !secrets.is_configured() {
            return Err(ConfigError::NoSecretSource);
        }
        Ok(secrets)
    }

    /// Build the state around an existing secret store
    pub fn with_secret_store(settings: Settings, secrets: SecretStore) -> Self {
        let secrets = Arc::new(secrets);
        let verifier = TokenVerifier::new(settings.token_leeway, settings.allow_literal_user_id);

        Self {
            gateway: Arc::new(AuthorizationGateway::new(secrets.clone(), verifier)),
            issuer: Arc::new(TokenIssuer::new(secrets.clone())),
            decisions: DecisionCache::new(&settings.decision_cache),
            secrets,
            settings: Arc::new(settings),
        }
    }

    /// Readiness: the signing secret can be resolved
    pub async fn health_check(&self) -> Result<Secret, SecretError> {
        self.secrets.resolve().await
    }
}
