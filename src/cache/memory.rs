//! In-memory cache backend
//!
//! DashMap-backed store with optional TTL. Suitable as the first link of a
//! chain in front of slower backends, or on its own for short-lived
//! processes.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::{CacheParams, ResponseCache};

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// TTL-aware in-memory response cache
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// Create a cache whose entries never expire
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Create a cache whose entries expire after `ttl`
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache for MemoryCache {
    fn lookup(&self, params: &CacheParams) -> Option<String> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(params.key()) {
            if !entry.is_expired(now) {
                debug!(key = params.key(), "memory cache hit");
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(params.key());
        }

        debug!(key = params.key(), "memory cache miss");
        None
    }

    fn store(&self, params: &CacheParams, value: &str) -> bool {
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(params.key().to_string(), entry);
        true
    }

    fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    fn clear_all(&self) {
        self.entries.clear();
    }
}
