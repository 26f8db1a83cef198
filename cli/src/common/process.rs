//! # dotlink Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Runs the shell commands used as `if` predicates on link entries. A predicate
//! is opaque to dotlink: it succeeds if and only if the command exits with code 0.
//!
//! ## Architecture
//!
//! - **`run_predicate`**: Spawns `sh -c <command>` (`cmd /C` on Windows) in the given
//!   working directory with inherited stdio and returns the exit code. A process
//!   killed by a signal has no exit code and is reported as `-1`.
//! - **`predicate_passes`**: Convenience wrapper that logs and folds spawn failures
//!   into "predicate false".
//!
use crate::core::error::{DotlinkError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Runs `command` through the platform shell in `cwd` and returns its exit code.
///
/// # Errors
///
/// Returns `DotlinkError::ExternalCommand` if the shell cannot be spawned.
pub fn run_predicate(command: &str, cwd: &Path) -> Result<i32> {
    #[cfg(windows)]
    let mut shell = {
        let mut shell = Command::new("cmd");
        shell.arg("/C").arg(command);
        shell
    };
    #[cfg(not(windows))]
    let mut shell = {
        let mut shell = Command::new("sh");
        shell.arg("-c").arg(command);
        shell
    };

    let status = shell
        .current_dir(cwd)
        .status()
        .map_err(|e| DotlinkError::ExternalCommand {
            cmd: command.to_string(),
            status: e.to_string(),
        })?;
    Ok(status.code().unwrap_or(-1))
}

/// True if `command` exits with code 0 when run in `cwd`.
pub fn predicate_passes(command: &str, cwd: &Path) -> bool {
    match run_predicate(command, cwd) {
        Ok(0) => true,
        Ok(code) => {
            debug!("Test '{}' returned false (exit code {})", command, code);
            false
        }
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}
