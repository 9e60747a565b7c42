use crate::config::DecisionCacheConfig;
use authorizer::AccessDecision;
use chrono::{DateTime, Utc};
use log::debug;
use moka::future::Cache as MokaCache;
use sha2::{Digest, Sha256};

/// Recently allowed decisions, keyed by credential digest and stage scope.
///
/// Deny decisions are never stored, so a transient secret store outage cannot
/// outlive itself in the cache. An entry never outlives the credential it was
/// decided for, whatever the configured TTL.
#[derive(Clone)]
pub enum DecisionCache {
    InMemory(MokaCache<String, CachedDecision>),
    /// Caching disabled
    Null,
}

#[derive(Debug, Clone)]
pub struct CachedDecision {
    decision: AccessDecision,
    valid_until: Option<DateTime<Utc>>,
}

impl CachedDecision {
    fn is_current(&self) -> bool {
        self.valid_until.is_none_or(|until| Utc::now() < until)
    }
}

impl DecisionCache {
    pub fn new(config: &DecisionCacheConfig) -> Self {
        if !config.is_enabled() {
            debug!("Decision cache disabled");
            return Self::Null;
        }

        let cache = MokaCache::builder()
            .time_to_live(config.ttl())
            .max_capacity(config.capacity)
            .build();
        Self::InMemory(cache)
    }

    /// Cache key for a raw credential within a resource scope. The credential itself is never kept.
    pub fn key(credential: &str, resource_scope: &str) -> String {
        let digest = Sha256::digest(credential.as_bytes());
        format!("{digest:x}:{resource_scope}")
    }

    pub async fn get(&self, key: &str) -> Option<AccessDecision> {
        let Self::InMemory(cache) = self else {
            return None;
        };
        let entry = cache.get(key).await?;
        if entry.is_current() {
            return Some(entry.decision);
        }
        debug!("Evicting decision for expired credential");
        cache.invalidate(key).await;
        None
    }

    /// Store an Allow decision until the TTL elapses or `valid_until` passes, whichever is first.
    pub async fn insert(
        &self,
        key: String,
        decision: &AccessDecision,
        valid_until: Option<DateTime<Utc>>,
    ) {
        let Self::InMemory(cache) = self else {
            return;
        };
        let entry = CachedDecision {
            decision: decision.clone(),
            valid_until,
        };
        if decision.is_allowed() && entry.is_current() {
            cache.insert(key, entry).await;
        }
    }
}
