//! # dotlink CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Verifies the top-level behavior of the `dotlink` binary: standard flags,
//! subcommand discovery and argument errors.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_link_command() {
    dotlink_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("link"));
}

#[test]
fn test_link_help_shows_options() {
    dotlink_cmd()
        .args(["link", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--manifest"))
        .stdout(predicate::str::contains("--base-dir"));
}

#[test]
fn test_missing_subcommand_is_rejected() {
    dotlink_cmd().assert().failure().code(2);
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    dotlink_cmd()
        .arg("unlink-everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
