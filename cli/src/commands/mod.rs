//! # dotlink Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Aggregates the top-level command groups of the dotlink CLI so that
//! `main.rs` can route to them.
//!
//! ## Command Groups
//!
//! - `link`: Converge the filesystem onto a mapping document.
//!
//! Each group defines its own arguments structure and handler function.
//!

/// Command group that creates, repairs and verifies the declared links.
pub mod link;
