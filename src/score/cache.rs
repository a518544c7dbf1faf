use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use dashmap::DashMap;
use tracing::debug;

use crate::config::ProfileCacheConfig;
use crate::score::profile::ProfileLookup;

/// Cached lookup with insertion time
#[derive(Clone, Debug)]
struct CacheEntry {
    lookup: ProfileLookup,
    inserted_at: Instant,
}

/// Profile lookup cache.
///
/// GitHub's unauthenticated API allows 60 requests an hour, so both positive
/// and negative answers are kept for `ttl_secs`. Results never depend on
/// whether an entry came from here or from the network.
pub struct ProfileCache {
    entries: DashMap<String, CacheEntry>,
    config: ProfileCacheConfig,
    // Stats
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ProfileCache {
    pub fn new(config: &ProfileCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: config.clone(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    /// Look up a cached profile. Logins are case-insensitive on GitHub.
    pub fn get(&self, login: &str) -> Option<ProfileLookup> {
        if !self.config.enabled {
            return None;
        }

        let key = login.to_lowercase();
        if let Some(entry) = self.entries.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.lookup.clone());
            }
            // Expired
            drop(entry);
            self.entries.remove(&key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, login: &str, lookup: &ProfileLookup) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        let key = login.to_lowercase();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict_one();
        }

        self.entries.insert(
            key,
            CacheEntry {
                lookup: lookup.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Evict the oldest entry
    fn evict_one(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!("Evicting cached profile for {}", key);
            self.entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Get cache stats for the health endpoint
    pub fn get_stats(&self) -> serde_json::Value {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 * 100.0 } else { 0.0 };

        serde_json::json!({
            "enabled": self.config.enabled,
            "entries": self.len(),
            "max_entries": self.config.max_entries,
            "ttl_secs": self.config.ttl_secs,
            "hits": hits,
            "misses": misses,
            "hit_rate_percent": format!("{:.1}", hit_rate),
            "evictions": self.evictions(),
        })
    }
}
