//! # dotlink Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout dotlink. It follows a
//! two-layer approach:
//! - `DotlinkError`: a `thiserror` enum naming the failure domains dotlink knows about.
//! - `Result<T>`: an alias for `anyhow::Result<T>` so callers can attach context freely.
//!
//! Most per-entry problems in the link engine are *not* errors in this sense: they
//! are logged as warnings and turned into a `false` contribution to the run result.
//! A `DotlinkError` (or any other `anyhow::Error`) escaping the engine means the
//! run itself could not continue.
//!
//! ## Examples
//!
//! ```rust
//! if raw.is_empty() {
//!     return Err(DotlinkError::InvalidPath {
//!         path: raw.to_string(),
//!         reason: "path is empty".into(),
//!     })?;
//! }
//!
//! let text = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read mapping: {}", path.display()))?;
//! ```
//!
use thiserror::Error;

/// Custom error type for dotlink.
#[derive(Error, Debug)]
pub enum DotlinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Mapping error: {0}")]
    Manifest(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    Glob { pattern: String, reason: String },

    #[error("External command failed: {cmd}, Status: {status}")]
    ExternalCommand { cmd: String, status: String },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
