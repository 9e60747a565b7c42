use confique::Config;
use std::time::Duration;

/// Configuration for the authorization decision cache
#[derive(Debug, Config, Clone)]
pub struct DecisionCacheConfig {
    /// Decision TTL in seconds, 0 disables caching (default: 300)
    #[config(env = "AUTHZ_DECISION_CACHE_TTL", default = 300)]
    pub ttl: u64,

    /// Maximum number of cached decisions (default: 10000)
    #[config(env = "AUTHZ_DECISION_CACHE_CAPACITY", default = 10000)]
    pub capacity: u64,
}

impl DecisionCacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.ttl > 0 && self.capacity > 0
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}
