//! # Permission Ledger
//!
//! File: cli/src/commands/link/perms.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Before dotlink links a source, it records the source's original mode, owner
//! and group into a YAML ledger so they can be restored later by other tooling:
//!
//! ```yaml
//! vimrc:
//!   mode: '0o644'
//!   uid: 1000
//!   gid: 1000
//! ```
//!
//! Keys are paths relative to the base directory. The first capture of a path
//! always wins: an existing record is never overwritten, within a run or across
//! runs, so the ledger keeps describing the state *before* dotlink touched anything.
//!
//! ## Architecture
//!
//! - **`Ledger`**: one open ledger file held in memory with a dirty flag.
//!   `open` never fails: a missing, unreadable or malformed file starts empty
//!   (with a warning). `record` adds missing entries; `flush` writes the whole
//!   document back atomically, only if something was added.
//! - **`LedgerRegistry`**: the run-scoped set of open ledgers keyed by file path,
//!   so every entry that names the same `perms-file` shares one `Ledger`.
//!   `flush_all` writes each ledger once. If the registry is dropped without an
//!   explicit `flush_all` (an early return or a panic in the run loop) its `Drop`
//!   implementation flushes instead, so captured records are never lost.
//!
use crate::common::fs::{io, links};
use crate::core::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Original mode and ownership of one path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Permission bits as an octal string, e.g. `0o644`.
    pub mode: String,
    pub uid: u32,
    pub gid: u32,
}

impl PermissionRecord {
    /// Builds a record from file metadata.
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            PermissionRecord {
                mode: format!("{:#o}", meta.mode() & 0o7777),
                uid: meta.uid(),
                gid: meta.gid(),
            }
        }
        #[cfg(not(unix))]
        {
            let mode = if meta.permissions().readonly() { 0o444 } else { 0o644 };
            PermissionRecord {
                mode: format!("{:#o}", mode),
                uid: 0,
                gid: 0,
            }
        }
    }
}

/// One ledger file, loaded in memory.
#[derive(Debug)]
pub struct Ledger {
    file: PathBuf,
    records: BTreeMap<String, PermissionRecord>,
    dirty: bool,
}

impl Ledger {
    /// Loads the ledger at `file`, starting empty if it is missing or unusable.
    pub fn open(file: &Path) -> Self {
        let records = match io::read_file_if_exists(file) {
            Ok(Some(text)) if !text.trim().is_empty() => {
                match serde_yaml::from_str::<BTreeMap<String, PermissionRecord>>(&text) {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("Ignoring malformed permissions file {:?}: {}", file, e);
                        BTreeMap::new()
                    }
                }
            }
            Ok(_) => BTreeMap::new(),
            Err(e) => {
                warn!("Ignoring unreadable permissions file {:?}: {:#}", file, e);
                BTreeMap::new()
            }
        };
        debug!("Opened permissions file {:?} ({} records)", file, records.len());
        Ledger {
            file: file.to_path_buf(),
            records,
            dirty: false,
        }
    }

    /// Captures `path` (and, for a directory, everything below it).
    ///
    /// `base` is the directory record keys are made relative to.
    ///
    /// # Returns
    ///
    /// * `true` - Recorded, already recorded, or skipped because `path` is a link.
    /// * `ignore_missing` - When `path` does not exist.
    /// * `false` - When reading metadata failed.
    pub fn record(&mut self, path: &Path, base: &Path, ignore_missing: bool) -> bool {
        if links::is_link(path) {
            warn!("Skipping permissions for symlink {:?}", path);
            return true;
        }
        if !links::exists(path) {
            warn!("Skipping permissions for nonexistent path {:?}", path);
            return ignore_missing;
        }
        match self.capture(path, base) {
            Ok(()) => true,
            Err(e) => {
                warn!("{:#} at {:?}", e, path);
                false
            }
        }
    }

    fn capture(&mut self, path: &Path, base: &Path) -> Result<()> {
        for entry in WalkDir::new(path) {
            let entry = entry.with_context(|| format!("Failed to walk {:?}", path))?;
            if entry.path_is_symlink() {
                continue;
            }
            let key = ledger_key(entry.path(), base);
            if self.records.contains_key(&key) {
                continue;
            }
            let meta = entry
                .metadata()
                .with_context(|| format!("Failed to stat {:?}", entry.path()))?;
            self.records.insert(key, PermissionRecord::from_metadata(&meta));
            self.dirty = true;
            debug!("Permissions added for {:?}.", entry.path());
        }
        Ok(())
    }

    /// The record for `key`, if any.
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&PermissionRecord> {
        self.records.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the ledger back if anything was added since it was opened.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty || self.records.is_empty() {
            return Ok(());
        }
        let text = serde_yaml::to_string(&self.records)
            .with_context(|| format!("Failed to serialize permissions for {:?}", self.file))?;
        io::write_file_atomic(&self.file, &text)?;
        self.dirty = false;
        debug!("Stored permissions at {:?}.", self.file);
        Ok(())
    }
}

/// The key a path is stored under: relative to `base` when below it.
pub fn ledger_key(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().into_owned()
        }
        _ => path.to_string_lossy().into_owned(),
    }
}

/// All ledgers opened during one run.
#[derive(Debug, Default)]
pub struct LedgerRegistry {
    ledgers: HashMap<PathBuf, Ledger>,
    flushed: bool,
}

impl LedgerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared ledger for `file`, opened on first use.
    pub fn ledger(&mut self, file: &Path) -> &mut Ledger {
        self.flushed = false;
        self.ledgers
            .entry(file.to_path_buf())
            .or_insert_with(|| Ledger::open(file))
    }

    /// Flushes every open ledger once.
    ///
    /// Returns `false` if any ledger could not be written; every ledger is
    /// attempted regardless.
    pub fn flush_all(&mut self) -> bool {
        let mut success = true;
        for ledger in self.ledgers.values_mut() {
            if let Err(e) = ledger.flush() {
                warn!("Failed to store permissions: {:#}", e);
                success = false;
            }
        }
        self.flushed = true;
        success
    }
}

impl Drop for LedgerRegistry {
    fn drop(&mut self) {
        if !self.flushed {
            debug!("Flushing permission ledgers on early exit");
            self.flush_all();
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_capture_wins() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("vimrc");
        fs::write(&source, "")?;
        let ledger_file = dir.path().join(".perms.yaml");

        let mut registry = LedgerRegistry::new();
        assert!(registry.ledger(&ledger_file).record(&source, dir.path(), false));
        let first = registry.ledger(&ledger_file).get("vimrc").cloned().unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let changed = if first.mode == "0o600" { 0o640 } else { 0o600 };
            fs::set_permissions(&source, fs::Permissions::from_mode(changed))?;
        }
        assert!(registry.ledger(&ledger_file).record(&source, dir.path(), false));
        assert_eq!(registry.ledger(&ledger_file).get("vimrc"), Some(&first));
        Ok(())
    }

    #[test]
    fn test_existing_file_records_are_kept_across_runs() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("vimrc");
        fs::write(&source, "")?;
        let ledger_file = dir.path().join(".perms.yaml");
        fs::write(&ledger_file, "vimrc:\n  mode: '0o600'\n  uid: 4242\n  gid: 4242\n")?;

        let mut ledger = Ledger::open(&ledger_file);
        assert!(ledger.record(&source, dir.path(), false));
        ledger.flush()?;

        let reopened = Ledger::open(&ledger_file);
        assert_eq!(reopened.get("vimrc").map(|r| r.uid), Some(4242));
        Ok(())
    }

    #[test]
    fn test_directory_records_descendants() -> Result<()> {
        let dir = tempdir()?;
        let tree = dir.path().join("nvim");
        fs::create_dir_all(tree.join("lua"))?;
        fs::write(tree.join("lua/init.lua"), "")?;

        let mut ledger = Ledger::open(&dir.path().join(".perms.yaml"));
        assert!(ledger.record(&tree, dir.path(), false));
        for key in ["nvim", "nvim/lua", "nvim/lua/init.lua"] {
            assert!(ledger.get(key).is_some(), "missing record for {}", key);
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_links_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("real");
        fs::write(&target, "")?;
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link)?;

        let mut ledger = Ledger::open(&dir.path().join(".perms.yaml"));
        assert!(ledger.record(&link, dir.path(), false));
        assert!(ledger.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_path_honours_ignore_missing() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");
        let mut ledger = Ledger::open(&dir.path().join(".perms.yaml"));
        assert!(!ledger.record(&missing, dir.path(), false));
        assert!(ledger.record(&missing, dir.path(), true));
        Ok(())
    }

    #[test]
    fn test_malformed_file_starts_empty_and_is_replaced() -> Result<()> {
        let dir = tempdir()?;
        let ledger_file = dir.path().join(".perms.yaml");
        fs::write(&ledger_file, "{{ not yaml ::")?;
        let source = dir.path().join("bashrc");
        fs::write(&source, "")?;

        let mut ledger = Ledger::open(&ledger_file);
        assert!(ledger.is_empty());
        assert!(ledger.record(&source, dir.path(), false));
        ledger.flush()?;
        assert_eq!(Ledger::open(&ledger_file).len(), 1);
        Ok(())
    }

    #[test]
    fn test_untouched_ledger_is_not_written() -> Result<()> {
        let dir = tempdir()?;
        let ledger_file = dir.path().join("state/.perms.yaml");
        let mut registry = LedgerRegistry::new();
        registry.ledger(&ledger_file);
        assert!(registry.flush_all());
        assert!(!ledger_file.exists());
        Ok(())
    }

    #[test]
    fn test_drop_flushes_unflushed_registry() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("gitconfig");
        fs::write(&source, "")?;
        let ledger_file = dir.path().join(".perms.yaml");
        {
            let mut registry = LedgerRegistry::new();
            registry.ledger(&ledger_file).record(&source, dir.path(), false);
        }
        assert!(Ledger::open(&ledger_file).get("gitconfig").is_some());
        Ok(())
    }

    #[test]
    fn test_ledger_key_outside_base_is_absolute() {
        let base = Path::new("/dots");
        assert_eq!(ledger_key(Path::new("/dots/vimrc"), base), "vimrc");
        assert_eq!(ledger_key(Path::new("/etc/hosts"), base), "/etc/hosts");
    }
}
