pub(crate) use crate::config::cache::DecisionCacheConfig;
pub(crate) use crate::config::secret_store::SecretStoreConfig;
use confique::Config;
use thiserror::Error;

pub mod cache;
pub mod secret_store;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] confique::Error),

    #[error("invalid secret store endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("AUTHZ_SECRET_STORE_SECRET_ID must not be empty when the secret store is enabled")]
    MissingSecretId,

    #[error(
        "no signing secret source configured: set AUTHZ_JWT_SECRET or AUTHZ_SECRET_STORE_ENABLED"
    )]
    NoSecretSource,
}

/// Main configuration structure for the authorizer server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the server listens on (default: 8080)
    #[config(env = "AUTHZ_PORT", default = 8080)]
    pub port: u16,

    /// Default signing secret, used when the secret store is disabled or unreachable
    #[config(env = "AUTHZ_JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Accept legacy literal user ids as credentials (default: true)
    #[config(env = "AUTHZ_ALLOW_LITERAL_USER_ID", default = true)]
    pub allow_literal_user_id: bool,

    /// Clock skew tolerated on signed credential expiry, in seconds (default: 60)
    #[config(env = "AUTHZ_TOKEN_LEEWAY", default = 60)]
    pub token_leeway: u64,

    #[config(nested)]
    pub secret_store: SecretStoreConfig,

    #[config(nested)]
    pub decision_cache: DecisionCacheConfig,
}

impl Settings {
    /// Load settings from the environment and validate them
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Self::builder().env().load()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_store.enabled {
            self.secret_store.endpoint_url()?;
            if self.secret_store.secret_id.trim().is_empty() {
                return Err(ConfigError::MissingSecretId);
            }
        } else if self.default_secret().is_none() {
            return Err(ConfigError::NoSecretSource);
        }
        Ok(())
    }

    pub fn default_secret(&self) -> Option<String> {
        self.jwt_secret.clone().filter(|s| !s.is_empty())
    }

    #[cfg(test)]
    pub fn for_test(jwt_secret: Option<&str>, secret_store: SecretStoreConfig) -> Self {
        Self {
            port: 0,
            jwt_secret: jwt_secret.map(str::to_string),
            allow_literal_user_id: true,
            token_leeway: 60,
            secret_store,
            decision_cache: DecisionCacheConfig {
                ttl: 60,
                capacity: 100,
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_env::ScopedEnv;
    use super::*;
    use crate::config::secret_store::tests::store_config;

    #[test]
    fn test_load_from_env() {
        let mut env = ScopedEnv::cleared("AUTHZ_");

        // Defaults alone have no secret source
        assert!(matches!(Settings::new(), Err(ConfigError::NoSecretSource)));

        env.set("AUTHZ_JWT_SECRET", "env-secret");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.default_secret().as_deref(), Some("env-secret"));
        assert!(settings.allow_literal_user_id);
        assert_eq!(settings.token_leeway, 60);
        assert!(!settings.secret_store.enabled);
        assert_eq!(settings.secret_store.endpoint, "http://localhost:2773");
        assert_eq!(settings.secret_store.secret_id, "fitness-app/jwt-secret");
        assert_eq!(settings.secret_store.field, "JWT_SECRET");
        assert_eq!(settings.secret_store.timeout, 3);
        assert_eq!(settings.decision_cache.ttl, 300);
        assert_eq!(settings.decision_cache.capacity, 10000);

        env.set("AUTHZ_PORT", "9090");
        env.set("AUTHZ_ALLOW_LITERAL_USER_ID", "false");
        env.set("AUTHZ_SECRET_STORE_ENABLED", "true");
        env.set("AUTHZ_DECISION_CACHE_TTL", "0");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.port, 9090);
        assert!(!settings.allow_literal_user_id);
        assert!(settings.secret_store.enabled);
        assert!(!settings.decision_cache.is_enabled());

        env.set("AUTHZ_SECRET_STORE_ENDPOINT", "::not-a-url::");
        assert!(matches!(
            Settings::new(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_scoped_env_restores_variables() {
        const NAME: &str = "AUTHZ_SCOPED_ENV_CHECK";
        {
            let mut env = ScopedEnv::cleared("AUTHZ_SCOPED_ENV_");
            env.set(NAME, "inside");
            assert_eq!(std::env::var(NAME).as_deref(), Ok("inside"));
        }
        assert!(std::env::var(NAME).is_err());
    }

    #[test]
    fn test_store_only_is_valid() {
        let settings = Settings::for_test(None, store_config(true, "http://localhost:2773"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_default_is_not_a_source() {
        let settings = Settings::for_test(Some(""), store_config(false, "http://localhost:2773"));
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::NoSecretSource)
        ));
    }

    #[test]
    fn test_store_requires_secret_id() {
        let mut store = store_config(true, "http://localhost:2773");
        store.secret_id = " ".to_string();
        let settings = Settings::for_test(Some("fallback"), store);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingSecretId)
        ));
    }
}
