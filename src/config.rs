use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::location::{DirectoryResolver, HttpDirectory, OptionCache, DEFAULT_DIRECTORY_URL};

pub struct Config {
    pub directory_url: String,
    pub cache_path: PathBuf,
    pub timeout: Duration,
    pub offline: bool,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read `LOCALITY_*` environment variables, falling back to defaults.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let cache_path = lookup("LOCALITY_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(OptionCache::default_path);

        Self {
            directory_url: lookup("LOCALITY_DIRECTORY_URL")
                .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string()),
            cache_path,
            timeout: Duration::from_secs(try_load(&lookup, "LOCALITY_TIMEOUT_SECS", 10)),
            offline: try_load(&lookup, "LOCALITY_OFFLINE", false),
            host: lookup("LOCALITY_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: try_load(&lookup, "LOCALITY_PORT", 8080),
        }
    }

    /// Build the cache → directory → built-in resolver this config describes.
    pub fn resolver(&self) -> DirectoryResolver {
        let remote = HttpDirectory::new(&self.directory_url, self.timeout);
        let cache = OptionCache::load_from(self.cache_path.clone());
        let mut resolver = DirectoryResolver::new(remote, cache);
        resolver.set_offline(self.offline);
        resolver
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}; using default: {default}");
            default
        }),
    }
}
