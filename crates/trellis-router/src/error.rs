//! Error types surfaced by the router core.
//!
//! Only unrecoverable conditions become errors. Unreadable directories,
//! unwritable cache locations, and corrupt cache records are all recovered
//! locally and logged instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// The configured routes root is missing or not a directory. The
    /// caller decides between failing startup and serving all-404.
    #[error("routes directory does not exist: {}", .0.display())]
    RoutesRootMissing(PathBuf),

    /// Two dynamic directories under one parent make resolution order
    /// depend on enumeration order, so the tree is rejected at build time.
    #[error(
        "multiple dynamic directories under {}: [{first}] and [{second}]",
        parent.display()
    )]
    DuplicateDynamicDir {
        parent: PathBuf,
        first: String,
        second: String,
    },
}
