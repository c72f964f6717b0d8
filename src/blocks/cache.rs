//! Bounded cache of drift reports for one detection cycle.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use super::analyze::DriftReport;

/// Capacity used when settings do not override it.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Cheap identity of a file's content: modification time and length.
///
/// `None` for a file that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileStamp {
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
    /// Length in bytes.
    pub len: u64,
}

/// Lowercase hex SHA-256 of `text`, used as the spec part of a cache key.
#[must_use]
pub fn fingerprint(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    stamp: Option<FileStamp>,
    spec_hash: String,
}

/// Drift reports keyed by (path, file stamp, spec fingerprint).
///
/// When full, the whole map is dropped before inserting; entries never need
/// recency tracking because a changed file produces a new key anyway.
#[derive(Debug)]
pub struct DriftCache {
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, DriftReport>>,
}

impl DriftCache {
    /// Create an empty cache holding at most `capacity` reports.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached report, or compute and remember it.
    pub fn get_or_insert_with(
        &self,
        path: &Path,
        stamp: Option<FileStamp>,
        spec_hash: &str,
        compute: impl FnOnce() -> DriftReport,
    ) -> DriftReport {
        let key = CacheKey {
            path: path.to_path_buf(),
            stamp,
            spec_hash: spec_hash.to_string(),
        };
        if let Some(hit) = self
            .entries
            .lock()
            .ok()
            .and_then(|guard| guard.get(&key).cloned())
        {
            return hit;
        }

        let report = compute();
        if let Ok(mut guard) = self.entries.lock() {
            if guard.len() >= self.capacity {
                guard.clear();
            }
            guard.insert(key, report.clone());
        }
        report
    }

    /// Number of cached reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |g| g.len())
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached report.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.clear();
        }
    }
}

impl Default for DriftCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
