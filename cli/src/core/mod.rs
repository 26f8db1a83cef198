//! # dotlink Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Foundational pieces the command modules build on.
//!
//! ## Architecture
//!
//! - `config`: Tool configuration files and the per-entry link options.
//! - `context`: The base directory of a run.
//! - `error`: Error types and the crate-wide `Result`.
//! - `manifest`: The YAML mapping document.
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{DotlinkError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
