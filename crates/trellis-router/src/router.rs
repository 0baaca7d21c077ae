//! The router facade: cache-backed resolution plus diagnostics.

use crate::cache::{CacheInfo, RouteCache};
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::request::RouteRequest;
use crate::resolver;
use crate::segment::{parse_handler_filename, HANDLER_EXT};
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A resolved request: the handler file to load and the parameters bound
/// while walking to it. The caller loads and invokes the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub handler_path: PathBuf,
    pub params: HashMap<String, String>,
}

/// Maps requests to handler files under a routes directory.
#[derive(Debug)]
pub struct Router {
    config: RouterConfig,
    cache: RouteCache,
}

impl Router {
    /// Validates the routes root and sets up the cache.
    pub fn new(config: RouterConfig) -> Result<Self, RouterError> {
        if !config.routes_dir.is_dir() {
            return Err(RouterError::RoutesRootMissing(config.routes_dir.clone()));
        }
        let cache = RouteCache::new(config.cache_file.clone(), config.use_cache);
        Ok(Router { config, cache })
    }

    pub fn routes_dir(&self) -> &Path {
        &self.config.routes_dir
    }

    /// Resolves a request to a handler file. `Ok(None)` is the not-found
    /// outcome the caller turns into a 404.
    pub fn resolve(&self, request: &RouteRequest) -> Result<Option<RouteMatch>, RouterError> {
        let segments = request.segments();
        let resolved = if self.config.use_cache {
            let index = self.cache.load_or_build(&self.config.routes_dir)?;
            resolver::resolve_with_index(&index, &segments, request.method)
        } else {
            resolver::resolve_from_fs(&self.config.routes_dir, &segments, request.method)
        };
        debug!(
            method = %request.method,
            path = %request.path,
            matched = resolved.is_some(),
            "resolved request"
        );
        Ok(resolved.map(|r| RouteMatch {
            handler_path: r.path,
            params: r.params,
        }))
    }

    /// Lists every resolvable logical route, deduplicated and sorted.
    ///
    /// `index` handlers collapse to their directory's route; dynamic
    /// segments keep their bracket syntax. Derived by a fresh walk, not
    /// from the cache.
    pub fn list_routes(&self) -> Vec<String> {
        let root = &self.config.routes_dir;
        let mut routes = BTreeSet::new();

        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(parsed) = parse_handler_filename(file_name) else {
                continue;
            };
            let parent = entry
                .path()
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(prefix_to_route)
                .unwrap_or_else(|| "/".to_string());

            if parsed.stem == "index" {
                routes.insert(parent);
            } else if parent == "/" {
                routes.insert(format!("/{}", parsed.stem));
            } else {
                routes.insert(format!("{}/{}", parent, parsed.stem));
            }
        }

        routes.into_iter().collect()
    }

    /// Cache diagnostics, see [`RouteCache::info`].
    pub fn cache_info(&self) -> CacheInfo {
        self.cache.info()
    }

    /// Drops the in-memory index and deletes the persisted record.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// The extension handler files must carry.
    pub fn handler_ext() -> &'static str {
        HANDLER_EXT
    }
}

fn prefix_to_route(prefix: &Path) -> String {
    let joined = prefix
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        format!("/{joined}")
    }
}
