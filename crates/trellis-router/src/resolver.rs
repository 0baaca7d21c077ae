//! Route resolution: walking path segments to a handler file.
//!
//! Two modes share one precedence contract. [`resolve_from_fs`] walks the
//! live filesystem and is the behavioral reference; [`resolve_with_index`]
//! walks a prebuilt [`RouteIndex`] and produces identical results for any
//! index built from the same tree.
//!
//! At each segment the resolver tries, in order:
//! 1. descend into a literal child directory,
//! 2. descend into the dynamic `[name]` child directory (binding the
//!    segment to `name`),
//! 3. match a handler file: exact name with exact method suffix, exact
//!    name implicit GET (GET requests only), dynamic/composite name with
//!    exact method suffix, dynamic/composite name implicit GET (GET only).
//!    The first match wins and resolution stops there.
//!
//! When every segment was consumed by directory descent, the final
//! directory's `index.<method>.php` / `index.php` is looked up with the
//! same method-then-GET-default rule.

use crate::index::{join_prefix, HandlerEntry, PrefixEntry, RouteIndex};
use crate::segment::{
    classify_stem, dynamic_param_name, parse_handler_filename, Method, SegmentPattern,
    HANDLER_EXT,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A successful resolution: the handler file plus every parameter bound on
/// the way there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub params: HashMap<String, String>,
}

/// Resolves against a prebuilt index. `None` means no handler matches.
pub fn resolve_with_index(
    index: &RouteIndex,
    segments: &[&str],
    method: Method,
) -> Option<Resolved> {
    let mut prefix = String::new();
    let mut params = HashMap::new();

    for segment in segments {
        let next = join_prefix(&prefix, segment);
        if index.prefix(&next).is_some() {
            prefix = next;
            continue;
        }

        let entry = index.prefix(&prefix)?;
        if let Some(dir) = entry.dynamic_dirs.first() {
            params.insert(dir.param.clone(), segment.to_string());
            prefix = join_prefix(&prefix, dir.literal_name()?);
            continue;
        }

        return match_leaf_entries(entry, segment, method, params);
    }

    lookup_index_file(index.prefix(&prefix)?, method, params)
}

/// Resolves by walking the live filesystem, re-reading directories at each
/// step. The behavioral reference for both modes.
pub fn resolve_from_fs(root: &Path, segments: &[&str], method: Method) -> Option<Resolved> {
    let mut current = root.to_path_buf();
    let mut params = HashMap::new();

    for segment in segments {
        let next = current.join(segment);
        if next.is_dir() {
            current = next;
            continue;
        }

        if let Some(dir) = dynamic_child_dir(&current) {
            params.insert(dir.param, segment.to_string());
            current = dir.path;
            continue;
        }

        return match_leaf_fs(&current, segment, method, params);
    }

    let index_method = current.join(format!("index.{method}.{HANDLER_EXT}"));
    if index_method.is_file() {
        return Some(Resolved {
            path: index_method,
            params,
        });
    }
    if method == Method::Get {
        let index_default = current.join(format!("index.{HANDLER_EXT}"));
        if index_default.is_file() {
            return Some(Resolved {
                path: index_default,
                params,
            });
        }
    }
    None
}

struct DynamicDir {
    param: String,
    path: PathBuf,
}

/// Finds the dynamic `[name]` child of a directory, lexicographically
/// first if an unvalidated tree carries more than one.
fn dynamic_child_dir(dir: &Path) -> Option<DynamicDir> {
    for (name, path, is_dir) in read_dir_sorted(dir) {
        if !is_dir {
            continue;
        }
        if let Some(param) = dynamic_param_name(&name) {
            return Some(DynamicDir {
                param: param.to_string(),
                path,
            });
        }
    }
    None
}

fn match_leaf_fs(
    dir: &Path,
    segment: &str,
    method: Method,
    mut params: HashMap<String, String>,
) -> Option<Resolved> {
    let exact = dir.join(format!("{segment}.{method}.{HANDLER_EXT}"));
    if exact.is_file() {
        return Some(Resolved {
            path: exact,
            params,
        });
    }

    if method == Method::Get {
        let default = dir.join(format!("{segment}.{HANDLER_EXT}"));
        if default.is_file() {
            return Some(Resolved {
                path: default,
                params,
            });
        }
    }

    let files = leaf_candidates(dir);
    if let Some((path, bindings)) = match_dynamic_files(&files, segment, method, true) {
        params.extend(bindings);
        return Some(Resolved { path, params });
    }
    if method == Method::Get {
        if let Some((path, bindings)) = match_dynamic_files(&files, segment, method, false) {
            params.extend(bindings);
            return Some(Resolved { path, params });
        }
    }
    None
}

/// Handler files of a directory in filename order, pre-parsed.
fn leaf_candidates(dir: &Path) -> Vec<(HandlerEntry, bool)> {
    read_dir_sorted(dir)
        .into_iter()
        .filter(|(_, _, is_dir)| !is_dir)
        .filter_map(|(name, path, _)| {
            let parsed = parse_handler_filename(&name)?;
            Some((
                HandlerEntry {
                    name: parsed.stem,
                    path,
                },
                parsed.explicit_method,
            ))
        })
        .collect()
}

/// Tries dynamic and composite stems against a segment, in filename order.
/// `explicit` selects `.{method}` suffixed files; otherwise implicit-GET
/// files. The caller has already checked the method gate for implicit.
fn match_dynamic_files(
    files: &[(HandlerEntry, bool)],
    segment: &str,
    method: Method,
    explicit: bool,
) -> Option<(PathBuf, Vec<(String, String)>)> {
    for (entry, has_suffix) in files {
        let wanted = if explicit {
            *has_suffix && entry.has_explicit_suffix(method)
        } else {
            !*has_suffix
        };
        if !wanted {
            continue;
        }
        match classify_stem(&entry.name) {
            SegmentPattern::Dynamic(name) => {
                return Some((entry.path.clone(), vec![(name, segment.to_string())]));
            }
            SegmentPattern::Composite(pattern) => {
                if let Some(bindings) = pattern.capture(segment) {
                    return Some((entry.path.clone(), bindings));
                }
            }
            SegmentPattern::Static(_) => {}
        }
    }
    None
}

fn match_leaf_entries(
    entry: &PrefixEntry,
    segment: &str,
    method: Method,
    mut params: HashMap<String, String>,
) -> Option<Resolved> {
    // The exact-name steps mirror the filesystem walk's literal path
    // joins, so they compare full filenames across every method bucket:
    // a segment like `about.get` names `about.get.php` directly even
    // though that file is indexed under the stem `about`.
    let exact = format!("{segment}.{method}.{HANDLER_EXT}");
    if let Some(handler) = entry
        .all_handlers()
        .find(|h| h.file_name() == Some(exact.as_str()))
    {
        return Some(Resolved {
            path: handler.path.clone(),
            params,
        });
    }

    if method == Method::Get {
        let default = format!("{segment}.{HANDLER_EXT}");
        if let Some(handler) = entry
            .all_handlers()
            .find(|h| h.file_name() == Some(default.as_str()))
        {
            return Some(Resolved {
                path: handler.path.clone(),
                params,
            });
        }
    }

    let with_method = entry.handlers_for(method);

    if let Some((path, bindings)) = match_dynamic_entries(with_method, segment, method, true) {
        params.extend(bindings);
        return Some(Resolved { path, params });
    }
    if method == Method::Get {
        if let Some((path, bindings)) =
            match_dynamic_entries(with_method, segment, method, false)
        {
            params.extend(bindings);
            return Some(Resolved { path, params });
        }
    }
    None
}

fn match_dynamic_entries(
    handlers: &[HandlerEntry],
    segment: &str,
    method: Method,
    explicit: bool,
) -> Option<(PathBuf, Vec<(String, String)>)> {
    for entry in handlers {
        let wanted = if explicit {
            entry.has_explicit_suffix(method)
        } else {
            entry.is_implicit_get()
        };
        if !wanted {
            continue;
        }
        match classify_stem(&entry.name) {
            SegmentPattern::Dynamic(name) => {
                return Some((entry.path.clone(), vec![(name, segment.to_string())]));
            }
            SegmentPattern::Composite(pattern) => {
                if let Some(bindings) = pattern.capture(segment) {
                    return Some((entry.path.clone(), bindings));
                }
            }
            SegmentPattern::Static(_) => {}
        }
    }
    None
}

fn lookup_index_file(
    entry: &PrefixEntry,
    method: Method,
    params: HashMap<String, String>,
) -> Option<Resolved> {
    let exact = format!("index.{method}.{HANDLER_EXT}");
    if let Some(handler) = entry
        .all_handlers()
        .find(|h| h.file_name() == Some(exact.as_str()))
    {
        return Some(Resolved {
            path: handler.path.clone(),
            params,
        });
    }

    if method == Method::Get {
        let default = format!("index.{HANDLER_EXT}");
        if let Some(handler) = entry
            .all_handlers()
            .find(|h| h.file_name() == Some(default.as_str()))
        {
            return Some(Resolved {
                path: handler.path.clone(),
                params,
            });
        }
    }
    None
}

fn read_dir_sorted(dir: &Path) -> Vec<(String, PathBuf, bool)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
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
