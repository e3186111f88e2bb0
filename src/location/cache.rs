//! File-based option-list cache at ~/.locality/cache.json.
//!
//! One entry per directory request (see `OptionsKey::cache_key`).
//! TTL: 7 days. PSGC data changes a few times a year.

use super::types::{LocationOption, OptionsKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CACHE_TTL_MS: i64 = 7 * 24 * 3600 * 1000; // 7 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    options: Vec<LocationOption>,
    timestamp: i64,
    #[serde(default)]
    source: Option<String>,
}

/// The option-list cache.
pub struct OptionCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl OptionCache {
    /// Load cache from the default location (~/.locality/cache.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load cache from a specific path.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        debug!(path = %path.display(), entries = entries.len(), "loaded option cache");
        Self { path, entries }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".locality")
            .join("cache.json")
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable option cache");
                None
            }
        }
    }

    /// Look up an option list. Returns None if missing or expired.
    pub fn get(&self, key: &OptionsKey) -> Option<Vec<LocationOption>> {
        let entry = self.entries.get(&key.cache_key())?;

        let now = chrono::Utc::now().timestamp_millis();
        if now.saturating_sub(entry.timestamp) > CACHE_TTL_MS {
            return None; // expired
        }

        Some(entry.options.clone())
    }

    /// Store an option list and persist to disk.
    pub fn put(&mut self, key: &OptionsKey, options: &[LocationOption], source: &str) {
        self.insert(key, options, source);
        self.persist();
    }

    /// Store an option list in memory only; see [`snapshot`](Self::snapshot).
    pub fn insert(&mut self, key: &OptionsKey, options: &[LocationOption], source: &str) {
        let entry = CacheEntry {
            options: options.to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: Some(source.to_string()),
        };
        self.entries.insert(key.cache_key(), entry);
    }

    /// Drop every entry and persist the empty cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Serialize the current entries so they can be written elsewhere,
    /// e.g. on a blocking thread.
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => Some(CacheSnapshot {
                path: self.path.clone(),
                json,
            }),
            Err(e) => {
                warn!(error = %e, "cannot serialize option cache");
                None
            }
        }
    }

    fn persist(&self) {
        if let Some(snapshot) = self.snapshot() {
            snapshot.write();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized cache contents bound for disk.
pub struct CacheSnapshot {
    path: PathBuf,
    json: String,
}

impl CacheSnapshot {
    /// Write to disk. Failures are logged and otherwise ignored.
    pub fn write(self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "cannot create cache directory");
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, self.json) {
            warn!(path = %self.path.display(), error = %e, "cannot write option cache");
        }
    }
}
