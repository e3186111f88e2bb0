//! Directory resolver — orchestrates the fallback chain.
//!
//! Flow:  Cache → PSGC directory (unless offline) → built-in dataset → error

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::cache::OptionCache;
use super::directory::Directory;
use super::providers::{self, HttpDirectory};
use super::types::{LocationError, LocationOption, OptionsKey};

/// The directory resolver with its fallback pipeline.
pub struct DirectoryResolver {
    remote: HttpDirectory,
    cache: Mutex<OptionCache>,
    offline: bool,
}

impl DirectoryResolver {
    pub fn new(remote: HttpDirectory, cache: OptionCache) -> Self {
        Self {
            remote,
            cache: Mutex::new(cache),
            offline: false,
        }
    }

    /// Set offline mode — skip network calls.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Resolve one option list through the full fallback chain.
    #[tracing::instrument(skip(self), fields(offline = self.offline))]
    pub async fn resolve(&self, key: &OptionsKey) -> Result<Vec<LocationOption>, LocationError> {
        // 1. Cache
        if let Some(options) = self.cached(key) {
            debug!(count = options.len(), "cache hit");
            return Ok(options);
        }

        // 2. Remote directory
        let mut last_error = None;
        if !self.offline {
            match self.remote.fetch(key).await {
                Ok(options) => {
                    if options.is_empty() {
                        debug!("directory returned an empty list; not caching");
                    } else {
                        self.store(key, &options).await;
                        info!(count = options.len(), "resolved from directory");
                    }
                    return Ok(options);
                }
                Err(e) => {
                    warn!(error = %e, "directory lookup failed, trying built-in data");
                    last_error = Some(e);
                }
            }
        }

        // 3. Built-in dataset
        if let Some(options) = providers::builtin_options(key) {
            debug!(count = options.len(), "resolved from built-in dataset");
            return Ok(options);
        }

        Err(match last_error {
            Some(e) => e,
            None if self.offline => LocationError::Offline(key.to_string()),
            None => LocationError::NotFound(key.to_string()),
        })
    }

    fn cached(&self, key: &OptionsKey) -> Option<Vec<LocationOption>> {
        match self.cache.lock() {
            Ok(cache) => cache.get(key),
            Err(poisoned) => poisoned.into_inner().get(key),
        }
    }

    /// Update the in-memory cache, then write it to disk on the blocking pool.
    async fn store(&self, key: &OptionsKey, options: &[LocationOption]) {
        let snapshot = {
            let mut cache = match self.cache.lock() {
                Ok(cache) => cache,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache.insert(key, options, "directory");
            cache.snapshot()
        };

        if let Some(snapshot) = snapshot {
            if let Err(e) = tokio::task::spawn_blocking(move || snapshot.write()).await {
                warn!(error = %e, "option cache write task failed");
            }
        }
    }
}

#[async_trait]
impl Directory for DirectoryResolver {
    async fn provinces(&self) -> Result<Vec<LocationOption>, LocationError> {
        self.resolve(&OptionsKey::Provinces).await
    }

    async fn municipalities(&self, province: &str) -> Result<Vec<LocationOption>, LocationError> {
        self.resolve(&OptionsKey::Municipalities(province.to_string())).await
    }

    async fn barangays(&self, municipality: &str) -> Result<Vec<LocationOption>, LocationError> {
        self.resolve(&OptionsKey::Barangays(municipality.to_string())).await
    }
}
