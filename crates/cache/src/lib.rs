//! Response cache consumed by the focusbridge client.
//!
//! The client depends only on the [`ResponseCache`] trait. [`TtlCache`] is the
//! in-memory implementation: entries expire after a time-to-live, the least
//! recently used entry is evicted when the cache is full, and a background
//! sweeper drops expired entries on a fixed interval.

mod key;
mod store;

pub use key::{CacheCategory, generate_key};
pub use store::TtlCache;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Construction settings for a cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CacheConfig {
    /// Maximum number of live entries.
    pub max_entries: usize,
    /// Time-to-live applied by [`ResponseCache::set`].
    #[serde(with = "duration_secs", rename = "defaultTtlSecs")]
    pub default_ttl: Duration,
    /// Period of the expired-entry sweeper.
    #[serde(with = "duration_secs", rename = "cleanupIntervalSecs")]
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, zero before the first lookup.
    pub hit_rate: f64,
}

/// Keyed storage for computed results.
///
/// Implementations must never panic or fail on lookups; a broken cache
/// behaves like an empty one.
pub trait ResponseCache: Send + Sync {
    /// Deterministic key for an operation and its parameters.
    fn generate_key(&self, operation: &str, params: &Value) -> String {
        generate_key(operation, params)
    }

    /// Fetch a live entry.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store an entry with the default time-to-live.
    fn set(&self, key: &str, value: Value);

    /// Store an entry with an explicit time-to-live.
    fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration);

    /// Drop every entry.
    fn clear(&self);

    /// Drop every entry belonging to `category`; returns how many were removed.
    fn invalidate_by_category(&self, category: CacheCategory) -> usize;

    /// Current counters.
    fn stats(&self) -> CacheStats;

    /// Stop background work and release all entries.
    fn destroy(&self);
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
