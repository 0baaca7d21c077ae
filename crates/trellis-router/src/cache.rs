//! Persisted route index cache with mtime-based staleness detection.
//!
//! The cache stores a [`CacheRecord`] (build timestamp + index) as JSON.
//! A record is valid only while its build time is at least the newest
//! modification time anywhere under the routes root; otherwise the next
//! load rebuilds and replaces it wholesale. Writes go to a temporary file
//! in the destination directory and are renamed into place, so a reader
//! never observes a partially written record.

use crate::error::RouterError;
use crate::index::RouteIndex;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The serialized cache payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Build time in epoch milliseconds, compared against file mtimes.
    pub built_at_ms: u64,
    pub index: RouteIndex,
}

/// Diagnostic snapshot of the cache, taken without side effects.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub enabled: bool,
    pub cache_file: PathBuf,
    pub last_update: Option<DateTime<Utc>>,
    pub file_exists: bool,
    pub file_size: u64,
    pub route_counts: RouteCounts,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteCounts {
    pub prefixes: usize,
    pub dynamic_dirs: usize,
    pub handlers: usize,
}

struct CacheState {
    built_at_ms: u64,
    index: Arc<RouteIndex>,
}

/// Owns persistence of the route index and its in-memory snapshot.
///
/// The snapshot is swapped whole behind a `RwLock`: many readers between
/// rebuilds, and no reader ever sees a half-built index.
pub struct RouteCache {
    enabled: bool,
    cache_file: RwLock<PathBuf>,
    state: RwLock<Option<CacheState>>,
}

impl fmt::Debug for RouteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCache")
            .field("enabled", &self.enabled)
            .field("cache_file", &self.cache_file())
            .finish_non_exhaustive()
    }
}

impl RouteCache {
    /// Creates a cache backed by `cache_file`.
    ///
    /// If the file's parent is missing or not a directory the backing
    /// store moves to the OS temp directory immediately; a later write
    /// failure triggers the same permanent fallback.
    pub fn new(cache_file: PathBuf, enabled: bool) -> Self {
        let cache_file = match cache_file.parent() {
            Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => cache_file,
            _ => {
                let fallback = fallback_cache_file();
                warn!(
                    configured = %cache_file.display(),
                    fallback = %fallback.display(),
                    "cache location unusable, falling back to temp directory"
                );
                fallback
            }
        };
        RouteCache {
            enabled,
            cache_file: RwLock::new(cache_file),
            state: RwLock::new(None),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn cache_file(&self) -> PathBuf {
        self.read_lock(&self.cache_file).clone()
    }

    /// Returns a valid index, rebuilding if the cache is disabled, absent,
    /// corrupt, or stale. The rebuild runs inline with the triggering call.
    pub fn load_or_build(&self, routes_root: &Path) -> Result<Arc<RouteIndex>, RouterError> {
        if !self.enabled {
            return Ok(Arc::new(RouteIndex::build(routes_root)?));
        }

        let newest = last_modified_ms(routes_root);

        if let Some(state) = self.read_lock(&self.state).as_ref() {
            if state.built_at_ms >= newest {
                return Ok(state.index.clone());
            }
        }

        if let Some(record) = self.read_record() {
            if record.built_at_ms >= newest {
                debug!(built_at_ms = record.built_at_ms, "route cache hit");
                let index = Arc::new(record.index);
                *self.write_lock(&self.state) = Some(CacheState {
                    built_at_ms: record.built_at_ms,
                    index: index.clone(),
                });
                return Ok(index);
            }
            debug!("route cache stale, rebuilding");
        }

        self.rebuild(routes_root)
    }

    /// True when anything under the root changed after `built_at_ms`.
    pub fn is_stale(routes_root: &Path, built_at_ms: u64) -> bool {
        last_modified_ms(routes_root) > built_at_ms
    }

    /// Drops the in-memory snapshot and deletes the persisted record.
    pub fn clear(&self) {
        *self.write_lock(&self.state) = None;
        let path = self.cache_file();
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(path = %path.display(), %err, "failed to remove cache file");
            }
        }
    }

    /// Diagnostic snapshot.
    pub fn info(&self) -> CacheInfo {
        let cache_file = self.cache_file();
        let file_size = fs::metadata(&cache_file).map(|m| m.len()).unwrap_or(0);
        let state = self.read_lock(&self.state);
        let (last_update, route_counts) = match state.as_ref() {
            Some(state) => (
                Utc.timestamp_millis_opt(state.built_at_ms as i64).single(),
                RouteCounts {
                    prefixes: state.index.prefix_count(),
                    dynamic_dirs: state.index.dynamic_dir_count(),
                    handlers: state.index.handler_count(),
                },
            ),
            None => (None, RouteCounts::default()),
        };
        CacheInfo {
            enabled: self.enabled,
            file_exists: cache_file.exists(),
            cache_file,
            last_update,
            file_size,
            route_counts,
        }
    }

    fn rebuild(&self, routes_root: &Path) -> Result<Arc<RouteIndex>, RouterError> {
        let index = Arc::new(RouteIndex::build(routes_root)?);
        let record = CacheRecord {
            built_at_ms: now_ms(),
            index: (*index).clone(),
        };
        debug!(
            root = %routes_root.display(),
            handlers = index.handler_count(),
            "rebuilt route index"
        );
        self.persist(&record);
        *self.write_lock(&self.state) = Some(CacheState {
            built_at_ms: record.built_at_ms,
            index: index.clone(),
        });
        Ok(index)
    }

    /// Reads and validates the persisted record. A missing or malformed
    /// record is treated as absent, never surfaced to the caller.
    fn read_record(&self) -> Option<CacheRecord> {
        let path = self.cache_file();
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(path = %path.display(), %err, "discarding corrupt cache record");
                None
            }
        }
    }

    fn persist(&self, record: &CacheRecord) {
        let json = match serde_json::to_string_pretty(record) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "failed to serialize cache record");
                return;
            }
        };

        let path = self.cache_file();
        if let Err(err) = write_atomic(&path, &json) {
            let fallback = fallback_cache_file();
            warn!(
                path = %path.display(),
                fallback = %fallback.display(),
                %err,
                "cache location not writable, falling back to temp directory"
            );
            match write_atomic(&fallback, &json) {
                Ok(()) => *self.write_lock(&self.cache_file) = fallback,
                Err(err) => warn!(%err, "failed to persist cache record, continuing uncached"),
            }
        }
    }

    fn read_lock<'a, T>(&self, lock: &'a RwLock<T>) -> RwLockReadGuard<'a, T> {
        lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock<'a, T>(&self, lock: &'a RwLock<T>) -> RwLockWriteGuard<'a, T> {
        lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Writes via a sibling temp file and rename, so concurrent readers only
/// ever see a complete record.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cache path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(format!(".tmp{}", std::process::id()));
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Newest modification time (epoch milliseconds) across the root and all
/// descendants, directories included. Unreadable entries are skipped.
fn last_modified_ms(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter_map(|meta| meta.modified().ok())
        .filter_map(|mtime| mtime.duration_since(UNIX_EPOCH).ok())
        .map(|age| age.as_millis() as u64)
        .max()
        .unwrap_or(0)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn fallback_cache_file() -> PathBuf {
    std::env::temp_dir().join("trellis_route_cache.json")
}
