//! Route index: a precomputed picture of the routes tree.
//!
//! The index maps each path prefix (the `/`-joined segments consumed so
//! far, `""` for the root) to the immediate contents of the matching
//! directory: handler files grouped by method, and the dynamic `[name]`
//! child directory if one exists. Descendants live under their own deeper
//! prefix key, never under the parent's.

use crate::error::RouterError;
use crate::segment::{dynamic_param_name, parse_handler_filename, Method, HANDLER_EXT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A handler file directly inside a prefix directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerEntry {
    /// Filename stem with the extension and method suffix stripped.
    pub name: String,
    /// Absolute path to the handler file.
    pub path: PathBuf,
}

impl HandlerEntry {
    /// Whether the file on disk carries an explicit `.{method}` suffix.
    /// Explicit files outrank implicit-GET files at the same name.
    pub(crate) fn has_explicit_suffix(&self, method: Method) -> bool {
        self.file_name()
            .map(|n| n == format!("{}.{}.{}", self.name, method, HANDLER_EXT))
            .unwrap_or(false)
    }

    /// Whether the file is a bare `<stem>.php` (implicit GET).
    pub(crate) fn is_implicit_get(&self) -> bool {
        self.file_name()
            .map(|n| n == format!("{}.{}", self.name, HANDLER_EXT))
            .unwrap_or(false)
    }

    /// Filename of the handler on disk. The exact-name leaf steps compare
    /// against this, not the parsed stem, because a request segment may
    /// itself contain a method-suffix-shaped dot.
    pub(crate) fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// The dynamic `[name]` child directory of a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicDirEntry {
    /// Parameter name declared by the brackets.
    pub param: String,
    /// Absolute path to the directory.
    pub path: PathBuf,
}

impl DynamicDirEntry {
    /// The directory's literal name (`[param]`), used to extend the prefix.
    pub(crate) fn literal_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Immediate contents of one prefix directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixEntry {
    /// Handler files grouped by method, each group in filename order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub handlers: BTreeMap<Method, Vec<HandlerEntry>>,
    /// Dynamic child directories. A validated tree has at most one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_dirs: Vec<DynamicDirEntry>,
}

impl PrefixEntry {
    pub(crate) fn handlers_for(&self, method: Method) -> &[HandlerEntry] {
        self.handlers.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every handler in the directory regardless of method bucket, for
    /// lookups keyed by full filename.
    pub(crate) fn all_handlers(&self) -> impl Iterator<Item = &HandlerEntry> {
        self.handlers.values().flatten()
    }
}

/// Precomputed mapping from prefixes to their immediate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteIndex {
    /// One entry per directory that existed at scan time, keyed by prefix.
    pub prefixes: BTreeMap<String, PrefixEntry>,
}

impl RouteIndex {
    /// Builds an index by recursively scanning the routes root.
    ///
    /// Directory entries are visited in lexicographic order so the built
    /// index is identical across platforms and runs. An unreadable
    /// subdirectory contributes no entries but does not fail the scan; a
    /// missing root or a parent with two dynamic children does.
    pub fn build(root: &Path) -> Result<RouteIndex, RouterError> {
        if !root.is_dir() {
            return Err(RouterError::RoutesRootMissing(root.to_path_buf()));
        }
        let mut index = RouteIndex::default();
        scan_dir(root, "", &mut index)?;
        Ok(index)
    }

    pub fn prefix(&self, key: &str) -> Option<&PrefixEntry> {
        self.prefixes.get(key)
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    pub fn handler_count(&self) -> usize {
        self.prefixes
            .values()
            .flat_map(|entry| entry.handlers.values())
            .map(Vec::len)
            .sum()
    }

    pub fn dynamic_dir_count(&self) -> usize {
        self.prefixes
            .values()
            .map(|entry| entry.dynamic_dirs.len())
            .sum()
    }
}

fn scan_dir(dir: &Path, prefix: &str, index: &mut RouteIndex) -> Result<(), RouterError> {
    let mut entry = PrefixEntry::default();
    let mut subdirs: Vec<(String, PathBuf)> = Vec::new();

    for (name, path, is_dir) in read_dir_sorted(dir) {
        if is_dir {
            if let Some(param) = dynamic_param_name(&name) {
                if let Some(existing) = entry.dynamic_dirs.first() {
                    return Err(RouterError::DuplicateDynamicDir {
                        parent: dir.to_path_buf(),
                        first: existing.param.clone(),
                        second: param.to_string(),
                    });
                }
                entry.dynamic_dirs.push(DynamicDirEntry {
                    param: param.to_string(),
                    path: path.clone(),
                });
            }
            subdirs.push((name, path));
        } else if let Some(parsed) = parse_handler_filename(&name) {
            entry
                .handlers
                .entry(parsed.method)
                .or_default()
                .push(HandlerEntry {
                    name: parsed.stem,
                    path,
                });
        }
    }

    index.prefixes.insert(prefix.to_string(), entry);

    for (name, path) in subdirs {
        let child_prefix = join_prefix(prefix, &name);
        scan_dir(&path, &child_prefix, index)?;
    }

    Ok(())
}

/// Extends a prefix with one more literal segment.
pub(crate) fn join_prefix(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}/{segment}")
    }
}

/// Reads a directory's children sorted by name. An unreadable directory is
/// treated as empty so a partially broken tree degrades to missing routes.
fn read_dir_sorted(dir: &Path) -> Vec<(String, PathBuf, bool)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut children: Vec<(String, PathBuf, bool)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let is_dir = entry.file_type().ok()?.is_dir();
            Some((name, entry.path(), is_dir))
        })
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}
