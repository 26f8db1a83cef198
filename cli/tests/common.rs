//! # dotlink CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and drives the compiled `dotlink` binary through
//! `assert_cmd`.
//!
//! `Sandbox` gives every test its own temporary directory tree with a fake home
//! (`HOME` and `XDG_CONFIG_HOME` point into it) next to a dotfiles directory, so
//! `~` expansion and user configuration never reach the real home directory.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// # Get dotlink Command (`dotlink_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `dotlink` binary.
///
/// ## Panics
/// Panics if the `dotlink` binary cannot be found via `Command::cargo_bin`.
pub fn dotlink_cmd() -> Command {
    Command::cargo_bin("dotlink").expect("Failed to find dotlink binary for testing")
}

/// A throwaway home directory and dotfiles directory.
pub struct Sandbox {
    pub root: TempDir,
    pub home: PathBuf,
    pub dots: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create sandbox");
        let home = root.path().join("home");
        let dots = root.path().join("dots");
        fs::create_dir_all(&home).expect("Failed to create sandbox home");
        fs::create_dir_all(&dots).expect("Failed to create sandbox dotfiles dir");
        Sandbox { root, home, dots }
    }

    /// Writes `dots/dotlink.yaml` and returns its path.
    pub fn write_manifest(&self, yaml: &str) -> PathBuf {
        let path = self.dots.join("dotlink.yaml");
        fs::write(&path, yaml).expect("Failed to write manifest");
        path
    }

    /// Writes a file under the dotfiles directory.
    pub fn add_source(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.dots.join(rel), content)
    }

    /// Writes a file under the fake home directory.
    pub fn add_home_file(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.home.join(rel), content)
    }

    /// The canonical form of a path under the dotfiles directory.
    pub fn canonical_source(&self, rel: &str) -> PathBuf {
        self.dots
            .canonicalize()
            .expect("Failed to canonicalize dotfiles dir")
            .join(rel)
    }

    /// `dotlink` running inside the sandbox with a hermetic environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = dotlink_cmd();
        cmd.current_dir(self.root.path())
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join(".config"))
            .env_remove("RUST_LOG")
            .env_remove("DOTLINK_MANIFEST")
            .env_remove("DOTLINK_BASE_DIR");
        cmd
    }

    /// `dotlink link --manifest dots/dotlink.yaml`.
    pub fn link(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("link").arg("--manifest").arg(self.dots.join("dotlink.yaml"));
        cmd
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(path, content).expect("Failed to write file");
    path.to_path_buf()
}

/// True if `path` is a symbolic link (without following it).
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}
