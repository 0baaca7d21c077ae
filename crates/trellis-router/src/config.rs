//! Router configuration, loaded from TOML with defaults for every field.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration for a [`crate::Router`].
///
/// Every field has a default, so a config file only needs to name what it
/// overrides. Programmatic overrides use struct update syntax:
///
/// ```
/// use trellis_router::RouterConfig;
///
/// let config = RouterConfig {
///     use_cache: false,
///     ..RouterConfig::default()
/// };
/// assert!(!config.use_cache);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Root of the routes tree.
    pub routes_dir: PathBuf,
    /// Backing store for the persisted route index.
    pub cache_file: PathBuf,
    /// When false, every resolution walks the filesystem directly.
    pub use_cache: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            routes_dir: PathBuf::from("routes"),
            cache_file: std::env::temp_dir().join("trellis_route_cache.json"),
            use_cache: true,
        }
    }
}

impl RouterConfig {
    /// Loads configuration from a TOML file, merging over defaults.
    ///
    /// A missing or malformed file yields the defaults; configuration
    /// problems are logged, never fatal.
    pub fn load(path: Option<&Path>) -> RouterConfig {
        let Some(path) = path else {
            return RouterConfig::default();
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "config file unreadable, using defaults");
                return RouterConfig::default();
            }
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "config file malformed, using defaults");
                RouterConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_enable_the_cache() {
        let config = RouterConfig::default();
        assert!(config.use_cache);
        assert_eq!(config.routes_dir, PathBuf::from("routes"));
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "routes_dir = \"site/routes\"").unwrap();
        writeln!(file, "use_cache = false").unwrap();

        let config = RouterConfig::load(Some(file.path()));
        assert_eq!(config.routes_dir, PathBuf::from("site/routes"));
        assert!(!config.use_cache);
        // Unspecified fields keep their defaults.
        assert_eq!(config.cache_file, RouterConfig::default().cache_file);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = RouterConfig::load(Some(Path::new("/nonexistent/trellis.toml")));
        assert!(config.use_cache);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "routes_dir = [not toml").unwrap();

        let config = RouterConfig::load(Some(file.path()));
        assert_eq!(config.routes_dir, PathBuf::from("routes"));
    }
}
