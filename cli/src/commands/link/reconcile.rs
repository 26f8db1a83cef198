//! # Link Reconciler
//!
//! File: cli/src/commands/link/reconcile.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Brings one concrete link (`ResolvedLink`) into agreement with the disk. The
//! steps run in a fixed order, each gated by the entry's `LinkConfig`:
//!
//! 1. **Create parent** (`create`): make the link's parent directory.
//! 2. **Backup** (`backup`, destination is a real path): copy it aside.
//! 3. **Existence precheck** (non-glob, not `ignore-missing`): stop here if the
//!    source is missing, so a real destination is never deleted for nothing.
//! 4. **Delete** (`force`, `relink` or `replace`): apply the deletion rules.
//! 5. **Already-satisfied shortcut** (`ignore-missing`, destination is a dangling link).
//! 6. **Record permissions** (`store-perms`): capture the source into the ledger.
//! 7. **Link or copy**: apply the link rules, or copy the source when `copy` is set.
//!
//! ## Architecture
//!
//! Both decision trees are tables of `(predicate, action)` pairs evaluated top
//! to bottom over a snapshot of the relevant filesystem facts (`DeleteState`,
//! `LinkState`). The first matching predicate decides; the snapshots are plain
//! values so each rule can be tested without touching the disk. Executing the
//! chosen action is a separate step.
//!
//! Every problem is logged and folded into the returned `bool`; nothing here
//! aborts the run.
//!
use super::backup;
use super::perms::LedgerRegistry;
use crate::common::fs::{copy, io, links, paths};
use crate::core::config::LinkConfig;
use crate::core::context::BaseDirectory;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A concrete link ready to be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Source path, absolute or relative to the base directory.
    pub source: PathBuf,
    /// Absolute path of the link to create.
    pub link_path: PathBuf,
    /// Fully resolved options for this link.
    pub config: LinkConfig,
    /// True when produced by glob expansion.
    pub globbed: bool,
}

// --- Deletion rules ---

/// Facts the deletion policy is decided on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteState {
    pub source_exists: bool,
    pub dest_regular: bool,
    pub dest_points_elsewhere: bool,
    pub dest_points_to_source: bool,
    pub replace: bool,
    pub ignore_missing: bool,
}

/// What the deletion policy does with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Remove unconditionally, real paths included.
    ForceRemove,
    /// Remove a link; remove a real path only with `force`.
    Remove,
    /// Leave the destination alone.
    Keep,
}

fn replaces_real_path(s: &DeleteState) -> bool {
    s.source_exists && s.dest_regular && s.replace
}

fn links_elsewhere(s: &DeleteState) -> bool {
    s.dest_points_elsewhere
}

fn is_real_path(s: &DeleteState) -> bool {
    s.dest_regular
}

fn links_to_vanished_source(s: &DeleteState) -> bool {
    s.dest_points_to_source && !s.ignore_missing && !s.source_exists
}

/// Deletion rules in precedence order. No match means `Keep`.
const DELETE_RULES: [(fn(&DeleteState) -> bool, DeleteAction); 4] = [
    (replaces_real_path, DeleteAction::ForceRemove),
    (links_elsewhere, DeleteAction::Remove),
    (is_real_path, DeleteAction::Remove),
    (links_to_vanished_source, DeleteAction::Remove),
];

/// Picks the deletion action for a destination.
pub fn decide_delete(state: &DeleteState) -> DeleteAction {
    DELETE_RULES
        .iter()
        .find(|(applies, _)| applies(state))
        .map_or(DeleteAction::Keep, |(_, action)| *action)
}

// --- Link rules ---

/// Facts the link decision is made on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkState {
    /// The destination resolves to something (following links).
    pub dest_exists: bool,
    /// The destination itself is a link.
    pub dest_is_link: bool,
    /// Stored target of the destination link, if it is one.
    pub dest_target: Option<PathBuf>,
    /// The target the link should store (absolute or relative form).
    pub computed_source: PathBuf,
    /// The absolute source resolves to something.
    pub source_exists: bool,
    /// The absolute source is itself a link (possibly dangling).
    pub source_is_link: bool,
    pub ignore_missing: bool,
}

impl LinkState {
    fn target_differs(&self) -> bool {
        self.dest_target
            .as_ref()
            .is_some_and(|target| *target != self.computed_source)
    }
}

/// Outcome of the link decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Dangling destination link with the wrong target; diagnostic only.
    InvalidLink,
    /// Source is absent and tolerated; nothing to link.
    SkipMissingSource,
    /// Create the link.
    Create,
    /// A real path occupies the destination.
    AlreadyExists,
    /// The destination links somewhere else.
    IncorrectLink,
    /// The source is missing.
    NonexistentSource,
    /// The correct link is already in place.
    AlreadyLinked,
}

fn dangling_wrong_link(s: &LinkState) -> bool {
    !s.dest_exists && s.dest_is_link && s.target_differs()
}

fn tolerated_missing_source(s: &LinkState) -> bool {
    !s.dest_exists && !s.dest_is_link && s.ignore_missing && !s.source_exists && !s.source_is_link
}

fn can_create(s: &LinkState) -> bool {
    !s.dest_exists && (s.ignore_missing || s.source_exists)
}

fn occupied_by_real_path(s: &LinkState) -> bool {
    s.dest_exists && !s.dest_is_link
}

fn wrong_link(s: &LinkState) -> bool {
    s.dest_is_link && s.target_differs()
}

fn missing_source(s: &LinkState) -> bool {
    !s.source_exists
}

/// Link rules in precedence order. No match means `AlreadyLinked`.
const LINK_RULES: [(fn(&LinkState) -> bool, LinkAction); 6] = [
    (dangling_wrong_link, LinkAction::InvalidLink),
    (tolerated_missing_source, LinkAction::SkipMissingSource),
    (can_create, LinkAction::Create),
    (occupied_by_real_path, LinkAction::AlreadyExists),
    (wrong_link, LinkAction::IncorrectLink),
    (missing_source, LinkAction::NonexistentSource),
];

/// Picks the link action for a destination.
pub fn decide_link(state: &LinkState) -> LinkAction {
    LINK_RULES
        .iter()
        .find(|(applies, _)| applies(state))
        .map_or(LinkAction::AlreadyLinked, |(_, action)| *action)
}

// --- Execution ---

/// Runs the reconciliation steps against the disk.
pub struct Reconciler<'a> {
    base: &'a BaseDirectory,
    ledgers: &'a mut LedgerRegistry,
}

impl<'a> Reconciler<'a> {
    pub fn new(base: &'a BaseDirectory, ledgers: &'a mut LedgerRegistry) -> Self {
        Reconciler { base, ledgers }
    }

    /// Reconciles one link. Returns `true` if every applicable step succeeded.
    pub fn reconcile(&mut self, link: &ResolvedLink) -> bool {
        let cfg = &link.config;
        let base = self.base.resolve(cfg.canonicalize);
        let absolute_source = paths::absolutize(&link.source, base);
        let link_path = link.link_path.as_path();
        let mut success = true;

        if cfg.create {
            success &= create_parent(link_path);
        }

        if cfg.backup && links::is_regular(link_path) {
            success &= backup::backup(link_path, &absolute_source, &cfg.backup_dir);
        }

        if !link.globbed && !cfg.ignore_missing && !links::exists(&absolute_source) {
            warn!(
                "Nonexistent source {} -> {}",
                link_path.display(),
                link.source.display()
            );
            return false;
        }

        let computed_source = computed_source(&absolute_source, link_path, cfg.relative);

        if cfg.force || cfg.relink || cfg.replace {
            success &= delete(link_path, &absolute_source, &computed_source, cfg);
        }

        if cfg.ignore_missing && !links::exists(link_path) && links::is_link(link_path) {
            debug!(
                "Link exists {} -> {}",
                link_path.display(),
                link.source.display()
            );
            return success;
        }

        if cfg.store_perms {
            success &= self
                .ledgers
                .ledger(&cfg.perms_file)
                .record(&absolute_source, base, cfg.ignore_missing);
        }

        success &= if cfg.copy {
            copy_into_place(&absolute_source, link_path, cfg.ignore_missing)
        } else {
            create_link(&absolute_source, link_path, &computed_source, cfg.ignore_missing)
        };
        success
    }
}

/// The target a link at `link_path` should store.
fn computed_source(absolute_source: &Path, link_path: &Path, relative: bool) -> PathBuf {
    if relative {
        paths::relativize(absolute_source, link_path)
    } else {
        absolute_source.to_path_buf()
    }
}

fn create_parent(link_path: &Path) -> bool {
    match io::ensure_parent_exists(link_path) {
        Ok(true) => {
            if let Some(parent) = link_path.parent() {
                debug!("Creating directory {}", parent.display());
            }
            true
        }
        Ok(false) => true,
        Err(e) => {
            warn!("Failed to create directory: {:#}", e);
            false
        }
    }
}

fn delete(link_path: &Path, absolute_source: &Path, computed_source: &Path, cfg: &LinkConfig) -> bool {
    let state = DeleteState {
        source_exists: links::exists(absolute_source),
        dest_regular: links::is_regular(link_path),
        dest_points_elsewhere: links::points_elsewhere(link_path, computed_source),
        dest_points_to_source: links::points_to(link_path, computed_source),
        replace: cfg.replace,
        ignore_missing: cfg.ignore_missing,
    };

    let force = match decide_delete(&state) {
        DeleteAction::Keep => return true,
        DeleteAction::ForceRemove => true,
        DeleteAction::Remove => cfg.force,
    };

    match links::remove_path(link_path, force) {
        Ok(true) => {
            debug!("Removing {}", link_path.display());
            true
        }
        Ok(false) => true,
        Err(e) => {
            warn!("Failed to remove {}: {:#}", link_path.display(), e);
            false
        }
    }
}

fn create_link(
    absolute_source: &Path,
    link_path: &Path,
    computed_source: &Path,
    ignore_missing: bool,
) -> bool {
    let state = LinkState {
        dest_exists: links::exists(link_path),
        dest_is_link: links::is_link(link_path),
        dest_target: links::link_target(link_path),
        computed_source: computed_source.to_path_buf(),
        source_exists: links::exists(absolute_source),
        source_is_link: links::is_link(absolute_source),
        ignore_missing,
    };
    let shown_target = || {
        state
            .dest_target
            .as_deref()
            .map(|t| t.display().to_string())
            .unwrap_or_default()
    };

    match decide_link(&state) {
        LinkAction::InvalidLink => {
            warn!("Invalid link {} -> {}", link_path.display(), shown_target());
            false
        }
        LinkAction::SkipMissingSource => {
            debug!(
                "Skipping {}: source {} does not exist",
                link_path.display(),
                absolute_source.display()
            );
            true
        }
        LinkAction::Create => match links::create_symlink(computed_source, link_path) {
            Ok(()) => {
                debug!(
                    "Creating link {} -> {}",
                    link_path.display(),
                    computed_source.display()
                );
                true
            }
            Err(e) => {
                warn!(
                    "Linking failed {} -> {}: {:#}",
                    link_path.display(),
                    computed_source.display(),
                    e
                );
                false
            }
        },
        LinkAction::AlreadyExists => {
            warn!(
                "{} already exists but is a regular file or directory",
                link_path.display()
            );
            false
        }
        LinkAction::IncorrectLink => {
            warn!("Incorrect link {} -> {}", link_path.display(), shown_target());
            false
        }
        LinkAction::NonexistentSource => {
            warn!(
                "Nonexistent source {} -> {}",
                link_path.display(),
                computed_source.display()
            );
            false
        }
        LinkAction::AlreadyLinked => {
            debug!(
                "Link exists {} -> {}",
                link_path.display(),
                computed_source.display()
            );
            true
        }
    }
}

fn copy_into_place(absolute_source: &Path, link_path: &Path, ignore_missing: bool) -> bool {
    if !links::exists(absolute_source) {
        if ignore_missing {
            debug!("Skipping copy of nonexistent source {}", absolute_source.display());
            return true;
        }
        warn!(
            "Nonexistent source {} -> {}",
            link_path.display(),
            absolute_source.display()
        );
        return false;
    }

    if links::is_link(link_path) {
        if let Err(e) = links::remove_path(link_path, false) {
            warn!("Failed to remove {}: {:#}", link_path.display(), e);
            return false;
        }
    }
    if links::exists(link_path) {
        debug!("Copy exists {}", link_path.display());
        return true;
    }

    match copy::copy_preserving(absolute_source, link_path) {
        Ok(()) => {
            debug!(
                "Copying {} -> {}",
                absolute_source.display(),
                link_path.display()
            );
            true
        }
        Err(e) => {
            warn!(
                "Copying failed {} -> {}: {:#}",
                absolute_source.display(),
                link_path.display(),
                e
            );
            false
        }
    }
}
