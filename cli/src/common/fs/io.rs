//! # dotlink Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Thin wrappers around `std::fs` used by the link engine and the document loaders.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: `mkdir -p`, failing if the path exists as a non-directory.
//! - **`ensure_parent_exists`**: Creates the parent directory of a path and reports
//!   whether anything was created (the link engine's "create parent" step).
//! - **`read_file_if_exists`**: Reads a text file, mapping "not found" to `None`.
//! - **`write_file_atomic`**: Writes to a sibling temporary file and renames it over
//!   the target, so an interrupted write never leaves a truncated ledger behind.
//!
use crate::core::error::{DotlinkError, Result};
use anyhow::Context;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path, creating parents as needed.
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or if creating it fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(DotlinkError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Ensures the parent directory of `path` exists.
///
/// # Returns
///
/// * `Ok(true)` - The parent was missing and has been created.
/// * `Ok(false)` - The parent already existed (or `path` has no parent).
pub fn ensure_parent_exists(path: &Path) -> Result<bool> {
    let Some(parent) = path.parent() else {
        return Ok(false);
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(false);
    }
    debug!("Try to create parent: {:?}", parent);
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {:?}", parent))?;
    Ok(true)
}

/// Reads a text file, returning `Ok(None)` when it does not exist.
pub fn read_file_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read file {:?}", path)),
    }
}

/// Writes `content` to `path` via a temporary sibling file and a rename.
///
/// The parent directory is created first if needed.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir_exists(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    {
        let mut temp_file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temporary file {:?}", temp_path))?;
        temp_file
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to file {:?}", temp_path))?;
        temp_file
            .sync_all()
            .with_context(|| format!("Failed to sync file {:?}", temp_path))?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to move {:?} into place at {:?}", temp_path, path))?;
    debug!("Wrote content to file: {:?}", path);
    Ok(())
}
