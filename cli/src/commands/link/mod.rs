//! # dotlink Link Command
//!
//! File: cli/src/commands/link/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `dotlink link` reads a mapping document and converges the filesystem onto it:
//! every declared destination becomes a symbolic link to (or a copy of) its
//! source inside the base directory. Runs are idempotent; a second run with
//! nothing changed reports success without touching the disk.
//!
//! ## Architecture
//!
//! The engine is split along its stages:
//! - `expand`: Glob Expander, fans a pattern out into concrete links.
//! - `perms`: Permission Ledger, records original mode/ownership before changes.
//! - `backup`: Backup Manager, copies displaced files aside.
//! - `reconcile`: Link Reconciler, the per-link state machine.
//! - `runner`: Entry Iterator, drives all entries and aggregates the result.
//!
//! `handle_link` wires the tool configuration, the mapping document and the
//! base directory together and hands them to the runner.
//!
//! ## Examples
//!
//! ```bash
//! # Use dotlink.yaml from the current directory (or the configured manifest)
//! dotlink link
//!
//! # Explicit mapping document and base directory, with progress output
//! dotlink -vv link --manifest ~/dotfiles/links.yaml --base-dir ~/dotfiles
//! ```
//!
use crate::core::config;
use crate::core::context::BaseDirectory;
use crate::core::error::{DotlinkError, Result};
use crate::core::manifest;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Resolves glob patterns into concrete links.
pub mod expand;
/// Records original permissions before paths are linked.
pub mod perms;
/// Copies displaced files out of the way.
pub mod backup;
/// Per-link reconciliation steps and decision rules.
pub mod reconcile;
/// Runs a whole mapping document.
pub mod runner;

const SUCCESS_SUMMARY: &str = "All links have been set up";
const FAILURE_SUMMARY: &str = "Some links were not successfully set up";

/// Arguments for the `link` command.
#[derive(Parser, Debug)]
pub struct LinkArgs {
    /// Path of the mapping document.
    /// Defaults to the configured `manifest`, or `dotlink.yaml`.
    #[arg(short, long, env = "DOTLINK_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Directory relative sources are resolved against.
    /// Defaults to the configured `base_dir`, or the mapping document's directory.
    #[arg(short, long, env = "DOTLINK_BASE_DIR")]
    pub base_dir: Option<PathBuf>,
}

/// # Handle Link Command (`handle_link`)
///
/// Loads the tool configuration and the mapping document, resolves the base
/// directory and runs every entry.
///
/// ## Arguments
///
/// * `args`: The parsed `LinkArgs`.
///
/// ## Returns
///
/// * `Result<bool>`: `Ok(true)` if every link was set up, `Ok(false)` if some
///   entries failed (each failure has already been logged).
///
/// ## Errors
///
/// Returns an error if the configuration or mapping document cannot be loaded.
pub fn handle_link(args: LinkArgs) -> Result<bool> {
    info!("Handling link command with args: {:?}", args);
    let tool_config = config::load_config()?;
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let manifest_path = cwd.join(args.manifest.unwrap_or_else(|| tool_config.manifest_path()));
    let manifest = manifest::load_manifest(&manifest_path)?;

    let base_dir = match args
        .base_dir
        .or_else(|| tool_config.base_dir.as_ref().map(PathBuf::from))
    {
        Some(dir) => dir,
        None => manifest.directory().map(PathBuf::from).ok_or_else(|| {
            DotlinkError::Config(format!(
                "cannot determine base directory for {}",
                manifest_path.display()
            ))
        })?,
    };
    let base = BaseDirectory::new(&base_dir)?;

    let success = runner::run(&manifest, &tool_config.defaults, &base);
    println!("{}", if success { SUCCESS_SUMMARY } else { FAILURE_SUMMARY });
    Ok(success)
}
