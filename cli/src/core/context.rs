//! # dotlink Run Context
//!
//! File: cli/src/core/context.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The base directory is the root every relative source in a mapping is
//! anchored to (usually the dotfiles repository). Entries may ask for it in two
//! forms: as written, or canonicalized so that symlinked ancestors are resolved
//! to their real location. Both forms are computed once per run.
//!
use crate::common::fs::paths;
use crate::core::error::{DotlinkError, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The base directory of a run, in its literal and canonical forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirectory {
    literal: PathBuf,
    canonical: PathBuf,
}

impl BaseDirectory {
    /// Builds the base directory from a (possibly relative) path.
    ///
    /// Relative paths are anchored at the current working directory. If the
    /// directory cannot be canonicalized (e.g. it does not exist yet) the
    /// literal form is used for both.
    pub fn new(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(DotlinkError::InvalidPath {
                path: String::new(),
                reason: "base directory is empty".into(),
            }
            .into());
        }
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let literal = paths::absolutize(path, &cwd);
        let canonical = match literal.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!("Cannot canonicalize base directory {:?}: {}", literal, e);
                literal.clone()
            }
        };
        debug!("Base directory: {:?} (canonical {:?})", literal, canonical);
        Ok(BaseDirectory { literal, canonical })
    }

    /// The base directory, canonicalized or as written.
    pub fn resolve(&self, canonicalize: bool) -> &Path {
        if canonicalize {
            &self.canonical
        } else {
            &self.literal
        }
    }
}
