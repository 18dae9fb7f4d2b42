//! File-backed cache backend
//!
//! One file per cache key under a spool directory, TTL judged by file
//! mtime. Every operation is best-effort: IO failures surface as misses
//! or a false store result, never as errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use super::{CacheParams, ResponseCache};

/// Response cache persisted as one file per key
pub struct FileCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileCache {
    /// Create a cache rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "failed to create cache directory");
        }
        Self { dir, ttl }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn is_expired(&self, path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified
                .elapsed()
                .map(|age| age >= ttl)
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

impl ResponseCache for FileCache {
    fn lookup(&self, params: &CacheParams) -> Option<String> {
        let path = self.entry_path(params.key());
        if !path.exists() {
            return None;
        }

        if self.is_expired(&path) {
            let _ = fs::remove_file(&path);
            debug!(key = params.key(), "file cache entry expired");
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = params.key(), error = %e, "file cache read failed");
                None
            }
        }
    }

    fn store(&self, params: &CacheParams, value: &str) -> bool {
        // Write-then-rename so a concurrent reader never sees a partial
        // entry.
        let path = self.entry_path(params.key());
        let staging = self.dir.join(format!("{}.tmp", params.key()));
        match fs::write(&staging, value).and_then(|()| fs::rename(&staging, &path)) {
            Ok(()) => true,
            Err(e) => {
                let _ = fs::remove_file(&staging);
                warn!(key = params.key(), error = %e, "file cache write failed");
                false
            }
        }
    }

    fn cleanup(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && self.is_expired(&path) {
                let _ = fs::remove_file(&path);
            }
        }
    }

    fn clear_all(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let _ = fs::remove_file(&path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use serde_json::{json, Map};

    fn params(id: i64) -> CacheParams {
        let mut parameters = Map::new();
        parameters.insert("id".to_string(), json!(id));
        CacheParams::for_action(&Action::new("read", "contact", parameters))
    }

    #[test]
    fn test_store_and_lookup_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), None);

        assert!(cache.lookup(&params(1)).is_none());
        assert!(cache.store(&params(1), r#"{"data":[]}"#));
        assert_eq!(cache.lookup(&params(1)).as_deref(), Some(r#"{"data":[]}"#));
    }

    #[test]
    fn test_store_leaves_only_the_final_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), None);

        cache.store(&params(1), "a");
        // Overwrite goes through the staging file and rename as well
        cache.store(&params(1), "b");

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
        assert_eq!(cache.lookup(&params(1)).as_deref(), Some("b"));
    }

    #[test]
    fn test_clear_all_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), None);

        cache.store(&params(1), "a");
        cache.store(&params(2), "b");
        cache.clear_all();

        assert!(cache.lookup(&params(1)).is_none());
        assert!(cache.lookup(&params(2)).is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Some(Duration::from_secs(0)));

        cache.store(&params(1), "a");
        assert!(cache.lookup(&params(1)).is_none());
    }

    #[test]
    fn test_cleanup_removes_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Some(Duration::from_secs(0)));

        cache.store(&params(1), "a");
        cache.cleanup();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
