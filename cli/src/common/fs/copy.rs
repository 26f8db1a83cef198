//! # dotlink Filesystem Copy Operations
//!
//! File: cli/src/common/fs/copy.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Copies files and directory trees while carrying their metadata over. Used by
//! the backup manager (copying a displaced path out of the way) and by copy mode
//! (materialising a source instead of linking it).
//!
//! ## Architecture
//!
//! Copying happens in two passes:
//! 1. **Content**: `std::fs::copy` for a single file, `fs_extra::dir::copy` with
//!    `copy_inside` for a tree (so `target` becomes the copy, like `cp -r src dst`).
//! 2. **Metadata**: `copy_metadata` applies permission bits, owner/group (Unix) and
//!    access/modification times (`filetime`) from each source entry to its copy.
//!    Trees are walked with `walkdir` children-first so directory times set last
//!    are not disturbed by later writes inside them.
//!
//! Symbolic links inside a tree are followed by the content pass and skipped by
//! the metadata pass.
//!
use crate::core::error::{DotlinkError, Result};
use anyhow::Context;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Copies `source` (file or directory) to `target`, then replicates metadata.
///
/// `target` must not exist yet.
///
/// # Errors
///
/// Returns an `Err` if `source` is neither a file nor a directory, or if any
/// content or metadata step fails.
pub fn copy_preserving(source: &Path, target: &Path) -> Result<()> {
    if source.is_dir() {
        copy_directory_recursive(source, target)?;
        copy_tree_metadata(source, target)
    } else if source.is_file() {
        fs::copy(source, target)
            .with_context(|| format!("Failed to copy file {:?} to {:?}", source, target))?;
        copy_metadata(source, target)
    } else {
        anyhow::bail!(DotlinkError::FileSystem(format!(
            "Path is neither file nor directory {:?}",
            source
        )))
    }
}

/// Copies a directory tree so that `target` becomes a replica of `source`.
pub fn copy_directory_recursive(source: &Path, target: &Path) -> Result<()> {
    debug!("Starting recursive copy from {:?} to {:?}", source, target);

    let mut options = fs_extra::dir::CopyOptions::new();
    // Copy *as* target rather than into target/<source name>.
    options.copy_inside = true;

    fs_extra::dir::copy(source, target, &options).map_err(|e| {
        anyhow::anyhow!(e).context(format!("Failed to copy dir {:?} to {:?}", source, target))
    })?;

    debug!("Finished recursive copy from {:?} to {:?}", source, target);
    Ok(())
}

/// Applies mode, owner/group and timestamps of `source` to `target`.
pub fn copy_metadata(source: &Path, target: &Path) -> Result<()> {
    let meta = fs::metadata(source)
        .with_context(|| format!("Failed to read metadata of {:?}", source))?;

    fs::set_permissions(target, meta.permissions())
        .with_context(|| format!("Failed to set permissions on {:?}", target))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        std::os::unix::fs::chown(target, Some(meta.uid()), Some(meta.gid()))
            .with_context(|| format!("Failed to set owner of {:?}", target))?;
    }

    let accessed = FileTime::from_last_access_time(&meta);
    let modified = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(target, accessed, modified)
        .with_context(|| format!("Failed to set timestamps on {:?}", target))?;
    Ok(())
}

/// Replicates metadata for every entry of an already-copied tree.
fn copy_tree_metadata(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).contents_first(true) {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", source))?;
        if entry.path_is_symlink() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{:?} escaped {:?} during walk", entry.path(), source))?;
        copy_metadata(entry.path(), &target.join(relative))?;
    }
    Ok(())
}
