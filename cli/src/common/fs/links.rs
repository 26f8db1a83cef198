//! # dotlink Symbolic Link Primitives
//!
//! File: cli/src/common/fs/links.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Small, single-purpose queries and mutations on symbolic links. The link
//! engine (`commands::link::reconcile`) composes these into its decision tables;
//! keeping them separate lets each predicate be read and tested on its own.
//!
//! ## Architecture
//!
//! - **Queries** (`is_link`, `exists`, `is_regular`, `link_target`, `points_to`,
//!   `points_elsewhere`): never fail. An I/O error while inspecting a path is
//!   treated as "not present" for that property.
//! - **`create_symlink`**: Platform-specific link creation. The stored target is
//!   written exactly as given, so relative targets stay relative.
//! - **`remove_path`**: Removes a link unconditionally and a real file or directory
//!   tree only when forced.
//!
//! Note that `exists` follows links (a dangling link does not "exist") while
//! `is_link` does not, mirroring the two views the decision tables need.
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// True if `path` itself is a symbolic link (dangling or not).
pub fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// True if `path` resolves to something on disk, following links.
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// True if `path` exists and is not a symbolic link (a "regular path").
pub fn is_regular(path: &Path) -> bool {
    exists(path) && !is_link(path)
}

/// The stored target of the link at `path`, if `path` is a link.
pub fn link_target(path: &Path) -> Option<PathBuf> {
    fs::read_link(path).ok()
}

/// True if `path` is a link whose stored target equals `target`.
pub fn points_to(path: &Path, target: &Path) -> bool {
    link_target(path).is_some_and(|current| current == target)
}

/// True if `path` is a link whose stored target differs from `target`.
pub fn points_elsewhere(path: &Path, target: &Path) -> bool {
    link_target(path).is_some_and(|current| current != target)
}

/// Creates a symbolic link at `link` storing `target`.
///
/// # Errors
///
/// Returns an `Err` if the link cannot be created (an entry already occupies
/// `link`, missing permissions, unsupported filesystem or platform).
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!("Failed to create symlink {:?} -> {:?}", link, target)
        })?;
    }
    #[cfg(windows)]
    {
        // Relative targets are resolved against the link's directory to pick the link kind.
        let resolved = link
            .parent()
            .map(|dir| dir.join(target))
            .unwrap_or_else(|| target.to_path_buf());
        let created = if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        created.with_context(|| {
            format!("Failed to create symlink {:?} -> {:?}", link, target)
        })?;
    }
    #[cfg(not(any(unix, windows)))]
    {
        anyhow::bail!("Symlink creation is not implemented for this platform.");
    }
    debug!("Created symlink: {:?} -> {:?}", link, target);
    Ok(())
}

/// Removes whatever is at `path`.
///
/// A symbolic link is always unlinked. A real file or directory tree is only
/// removed when `force` is set.
///
/// # Returns
///
/// * `Ok(true)` - Something was removed.
/// * `Ok(false)` - Nothing was removed (real path without `force`, or nothing there).
pub fn remove_path(path: &Path, force: bool) -> Result<bool> {
    if is_link(path) {
        fs::remove_file(path).with_context(|| format!("Failed to remove link {:?}", path))?;
        return Ok(true);
    }
    if !force || !exists(path) {
        return Ok(false);
    }
    if path.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory {:?}", path))?;
    } else {
        fs::remove_file(path).with_context(|| format!("Failed to remove file {:?}", path))?;
    }
    Ok(true)
}
