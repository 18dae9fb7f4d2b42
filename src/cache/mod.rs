//! Pluggable response cache backends
//!
//! Zero or more backends form an ordered chain owned by the orchestrator.
//! Reads walk the chain in order and the first non-empty hit wins; writes
//! fan out to every backend and individual write failures are non-fatal.
//! The chain is best-effort: no consistency between backends is assumed.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use serde_json::Value;

use crate::action::Action;

/// Canonical lookup parameters handed to cache backends
///
/// Carries the action's canonical form for backends that want to inspect
/// it, plus the precomputed fingerprint every backend should key on.
#[derive(Debug, Clone)]
pub struct CacheParams {
    params: Value,
    key: String,
}

impl CacheParams {
    pub fn for_action(action: &Action) -> Self {
        Self {
            params: action.canonical_form(),
            key: action.fingerprint(),
        }
    }

    /// Content-addressable cache key (the action fingerprint)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical action parameters, caller key order
    pub fn params(&self) -> &Value {
        &self.params
    }
}

/// Storage backend for wire-level outcomes
///
/// Implementations must be safe to share across orchestrator instances;
/// the chain holds them behind `Arc`.
pub trait ResponseCache: Send + Sync {
    /// Look up a stored outcome, `None` when absent
    fn lookup(&self, params: &CacheParams) -> Option<String>;

    /// Store an outcome; returns false when the backend declined or failed
    fn store(&self, params: &CacheParams, value: &str) -> bool;

    /// Maintenance hook for expired entries; backends that clean up on
    /// their own can leave this empty
    fn cleanup(&self) {}

    /// Purge the entire backend
    fn clear_all(&self);
}
