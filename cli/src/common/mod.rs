//! # dotlink Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared utilities used by the command modules, kept apart from command logic
//! (`commands::`) and core infrastructure (`core::`).
//!
//! ## Architecture
//!
//! - **`fs`**: Filesystem operations: path handling, I/O, copies and symbolic links.
//! - **`process`**: Running the shell predicates that gate link entries.
//!

/// Utilities for filesystem operations (paths, copying, I/O, links).
pub mod fs;
/// Utilities for executing external commands.
pub mod process;
