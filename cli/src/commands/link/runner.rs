//! # Entry Iterator
//!
//! File: cli/src/commands/link/runner.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Runs every entry of a mapping document through the link engine, in document
//! order, and reports whether all of them succeeded.
//!
//! ## Architecture
//!
//! For each entry:
//! 1. The option layers are merged (`tool defaults < document defaults < entry`)
//!    and resolved into one `LinkConfig`.
//! 2. The `if` predicate, when present, gates the entry. A failing predicate
//!    skips the entry without counting as a failure.
//! 3. The destination and source are expanded and anchored at the base directory.
//! 4. A globbed source fans out through `expand::expand`; every match is
//!    reconciled as its own `ResolvedLink`. Otherwise the entry is reconciled once.
//!
//! Every per-entry problem is folded into the aggregate `bool`, including an
//! entry that cannot be interpreted at all (an unset `$VAR`, a malformed glob
//! pattern): it is logged, counted as failed, and the next entry still runs.
//! The `LedgerRegistry` flushes through its drop guard if the loop unwinds.
//!
use super::expand::{self, GlobPattern};
use super::perms::LedgerRegistry;
use super::reconcile::{Reconciler, ResolvedLink};
use crate::common::fs::paths;
use crate::common::process;
use crate::core::config::{LinkConfig, LinkOverrides};
use crate::core::context::BaseDirectory;
use crate::core::error::Result;
use crate::core::manifest::{LinkSpec, Manifest};
use tracing::{debug, error, info, warn};

/// Processes every entry of `manifest` and returns the aggregate result.
///
/// # Arguments
///
/// * `manifest` - The parsed mapping document.
/// * `tool_defaults` - Link option defaults from the tool configuration.
/// * `base` - The base directory relative sources are anchored at.
///
/// # Returns
///
/// * `bool` - `true` if every entry succeeded and every ledger was written.
pub fn run(manifest: &Manifest, tool_defaults: &LinkOverrides, base: &BaseDirectory) -> bool {
    let defaults = tool_defaults.merge(&manifest.defaults);
    let mut ledgers = LedgerRegistry::new();

    let mut success = true;
    for entry in &manifest.entries {
        match run_entry(entry, &defaults, base, &mut ledgers) {
            Ok(entry_success) => success &= entry_success,
            Err(e) => {
                warn!("Invalid entry {}: {:#}", entry.destination, e);
                success = false;
            }
        }
    }
    success &= ledgers.flush_all();

    if success {
        info!("All links have been set up");
    } else {
        error!("Some links were not successfully set up");
    }
    success
}

fn run_entry(
    entry: &LinkSpec,
    defaults: &LinkOverrides,
    base: &BaseDirectory,
    ledgers: &mut LedgerRegistry,
) -> Result<bool> {
    let overrides = defaults.merge(&entry.overrides);
    let config = LinkConfig::resolve(base.resolve(true), &overrides)?;
    let anchor = base.resolve(config.canonicalize);

    if let Some(command) = &config.condition {
        if !process::predicate_passes(command, anchor) {
            debug!("Skipping {}", entry.destination);
            return Ok(true);
        }
    }

    let link_path = paths::absolutize(&paths::normalize(&entry.destination)?, anchor);
    let raw_source = entry.source_or_default();
    let mut reconciler = Reconciler::new(base, ledgers);

    if config.glob && paths::has_glob_chars(&raw_source) {
        let pattern = GlobPattern::anchored(&raw_source, anchor)?;
        let excludes = config
            .exclude
            .iter()
            .map(|exclude| GlobPattern::anchored(exclude, anchor))
            .collect::<Result<Vec<_>>>()?;
        let matches = expand::expand(&pattern, &excludes, &link_path, &config.prefix)?;
        debug!("Globs from '{}': {} matches", pattern.as_str(), matches.len());

        let mut success = true;
        for found in matches {
            success &= reconciler.reconcile(&ResolvedLink {
                source: found.source,
                link_path: found.destination,
                config: config.clone(),
                globbed: true,
            });
        }
        return Ok(success);
    }

    let source = paths::normalize(&raw_source)?;
    Ok(reconciler.reconcile(&ResolvedLink {
        source,
        link_path,
        config,
        globbed: false,
    }))
}
