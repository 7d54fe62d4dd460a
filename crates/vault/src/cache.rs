//! Read-through plaintext cache with a bounded TTL.
//!
//! The cache is an explicit object constructed once at service startup and
//! passed by reference; the clock is injected so tests can assert eviction
//! deterministically. Entries are process-local and eventually consistent
//! across instances: a secret rotated elsewhere stays stale here until TTL
//! expiry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use staffsight_core::{Clock, TenantId};

/// Default TTL for cached plaintext (5 minutes).
pub const DEFAULT_TTL_SECS: i64 = 300;

type CacheKey = (TenantId, String, String);

struct CacheEntry {
    plaintext: String,
    cached_at: DateTime<Utc>,
}

/// TTL cache over decrypted secret values.
pub struct SecretCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SecretCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Fresh cached plaintext, if any. Expired entries are evicted on read.
    pub fn get(&self, tenant_id: TenantId, service: &str, key: &str) -> Option<String> {
        let cache_key = (tenant_id, service.to_string(), key.to_string());
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap();
            match entries.get(&cache_key) {
                Some(entry) if now - entry.cached_at < self.ttl => {
                    return Some(entry.plaintext.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it outside the read lock.
        self.entries.write().unwrap().remove(&cache_key);
        None
    }

    pub fn insert(&self, tenant_id: TenantId, service: &str, key: &str, plaintext: String) {
        let cache_key = (tenant_id, service.to_string(), key.to_string());
        self.entries.write().unwrap().insert(
            cache_key,
            CacheEntry {
                plaintext,
                cached_at: self.clock.now(),
            },
        );
    }

    /// Drop one cached entry.
    pub fn remove(&self, tenant_id: TenantId, service: &str, key: &str) {
        let cache_key = (tenant_id, service.to_string(), key.to_string());
        self.entries.write().unwrap().remove(&cache_key);
    }

    /// Drop all cached entries for a service.
    pub fn remove_service(&self, tenant_id: TenantId, service: &str) {
        self.entries
            .write()
            .unwrap()
            .retain(|(t, s, _), _| !(*t == tenant_id && s == service));
    }
}
