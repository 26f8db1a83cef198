//! # Backup Manager
//!
//! File: cli/src/commands/link/backup.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Copies a real file or directory out of a link's way before anything
//! destructive happens to it. Callers only invoke it for a *regular* path (one
//! that exists and is not itself a link).
//!
//! ## Architecture
//!
//! - If the entry's source exists (or is a link), the displaced path is copied to
//!   `<backup_dir>/<name>--<YYYY-MM-DD-HH-MM>` using local time.
//! - If the source is missing, the displaced path is copied *to the source
//!   location* instead, adopting the existing file into the dotfiles directory.
//! - A backup target that already exists counts as done. Names have minute
//!   resolution, so two runs inside the same minute share one backup.
//! - Content and metadata are copied with `common::fs::copy::copy_preserving`.
//!
//! Failures are mostly soft: a failed copy is logged and the entry carries on.
//! Only an unusable backup directory or a displaced path that is neither a file
//! nor a directory fails the entry.
//!
use crate::common::fs::{copy, io, links};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Timestamp format appended to backup names (minute resolution).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Backs up the regular path at `link_path`, stamping with the current time.
///
/// `source` is the absolute source the link will point to.
pub fn backup(link_path: &Path, source: &Path, backup_dir: &Path) -> bool {
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    backup_with_stamp(link_path, source, backup_dir, &stamp)
}

/// Backup name for `link_path` with the given timestamp.
pub fn backup_name(link_path: &Path, stamp: &str) -> String {
    let name = link_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}--{}", name, stamp)
}

/// `backup` with an explicit timestamp string.
pub fn backup_with_stamp(link_path: &Path, source: &Path, backup_dir: &Path, stamp: &str) -> bool {
    let target: PathBuf = if links::exists(source) || links::is_link(source) {
        if let Err(e) = io::ensure_dir_exists(backup_dir) {
            warn!("{:#} at {:?}", e, backup_dir);
            return false;
        }
        backup_dir.join(backup_name(link_path, stamp))
    } else {
        source.to_path_buf()
    };

    if links::exists(&target) || links::is_link(&target) {
        debug!("Destination Already Exists {:?}", target);
        return true;
    }

    if !link_path.is_dir() && !link_path.is_file() {
        warn!("Path is neither file nor directory {:?}", link_path);
        return false;
    }

    if let Err(e) = io::ensure_parent_exists(&target) {
        warn!("{:#} at {:?}", e, target);
        return true;
    }
    match copy::copy_preserving(link_path, &target) {
        Ok(()) => debug!("Backing up {:?} -> {:?}", link_path, target),
        Err(e) => warn!("{:#} at {:?} -> {:?}", e, link_path, target),
    }
    true
}
