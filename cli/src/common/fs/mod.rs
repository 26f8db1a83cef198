//! # dotlink Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Groups the filesystem building blocks the link engine is assembled from.
//!
//! ## Architecture
//!
//! - **`copy`**: Content + metadata copies of files and trees (`fs_extra`, `filetime`, `walkdir`).
//! - **`io`**: Directory creation, optional reads and atomic writes.
//! - **`links`**: Symbolic-link queries, creation and removal.
//! - **`paths`**: Pure path expansion, normalisation and relativisation.
//!
//! Callers import from the specific submodule, e.g. `crate::common::fs::links::is_link`.
//!

/// Copies files and directory trees together with their metadata.
pub mod copy;
/// Basic I/O helpers (`ensure_dir_exists`, `read_file_if_exists`, `write_file_atomic`).
pub mod io;
/// Symbolic link predicates and mutations.
pub mod links;
/// Path expansion and normalisation (`normalize`, `default_source_name`, `relativize`).
pub mod paths;
