use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{task::JoinHandle, time::Instant};
use tracing::debug;

use crate::{CacheCategory, CacheConfig, CacheStats, ResponseCache};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    destroyed: bool,
}

impl CacheState {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    fn evict_least_recently_used(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.evictions += 1;
            debug!(cache_key = %key, "cache evicted least recently used entry");
        }
    }
}

/// In-memory [`ResponseCache`] with per-entry expiry and LRU size eviction.
///
/// Values are stored whole under a single lock, so a reader sees either no
/// entry or the complete value.
pub struct TtlCache {
    state: Arc<Mutex<CacheState>>,
    config: CacheConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache").field("config", &self.config).finish()
    }
}

impl TtlCache {
    /// Create a cache. When called inside a tokio runtime the expired-entry
    /// sweeper is started as well.
    pub fn new(config: CacheConfig) -> Self {
        let state = Arc::new(Mutex::new(CacheState::default()));
        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) if !config.cleanup_interval.is_zero() => {
                Some(handle.spawn(run_sweeper(Arc::clone(&state), config.cleanup_interval)))
            }
            _ => {
                debug!("cache created without a background sweeper");
                None
            }
        };
        Self {
            state,
            config,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Settings this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Remove expired entries now; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock_state().purge_expired(Instant::now())
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        lock_recovering(&self.state)
    }
}

fn lock_recovering(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_sweeper(state: Arc<Mutex<CacheState>>, every: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    loop {
        ticker.tick().await;
        let removed = lock_recovering(&state).purge_expired(Instant::now());
        if removed > 0 {
            debug!(removed, "cache sweeper dropped expired entries");
        }
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let live = match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            _ => None,
        };
        if live.is_some() {
            state.hits += 1;
        } else {
            // Drops the entry if it was present but expired.
            state.entries.remove(key);
            state.misses += 1;
        }
        live
    }

    fn set(&self, key: &str, value: Value) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        let now = Instant::now();
        let mut state = self.lock_state();
        if state.destroyed {
            debug!(cache_key = %key, "ignoring write to destroyed cache");
            return;
        }
        if !state.entries.contains_key(key) && state.entries.len() >= self.config.max_entries {
            state.purge_expired(now);
            while state.entries.len() >= self.config.max_entries.max(1) {
                state.evict_least_recently_used();
            }
        }
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_accessed: now,
            },
        );
    }

    fn clear(&self) {
        self.lock_state().entries.clear();
    }

    fn invalidate_by_category(&self, category: CacheCategory) -> usize {
        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|key, _| !category.matches_key(key));
        let removed = before - state.entries.len();
        debug!(category = %category, removed, "cache category invalidated");
        removed
    }

    fn stats(&self) -> CacheStats {
        let state = self.lock_state();
        let lookups = state.hits + state.misses;
        CacheStats {
            size: state.entries.len(),
            max_entries: self.config.max_entries,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }

    fn destroy(&self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
        let mut state = self.lock_state();
        state.entries.clear();
        state.destroyed = true;
    }
}

impl Drop for TtlCache {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
