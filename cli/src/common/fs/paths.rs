//! # dotlink Path Resolution
//!
//! File: cli/src/common/fs/paths.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Pure helpers that turn the path strings found in a mapping document into
//! concrete filesystem paths. Nothing in this module touches the disk.
//!
//! ## Architecture
//!
//! - **`expand`**: Expands `$VAR`, `${VAR}` and a leading `~` using `shellexpand`,
//!   with the home directory provided by `dirs`. An undefined variable is an
//!   `InvalidPath` error rather than being silently left in place.
//! - **`clean`**: Lexically collapses `.` and `..` components (no symlink resolution).
//! - **`normalize`**: `expand` followed by `clean`.
//! - **`absolutize`**: Anchors a relative path under a base directory.
//! - **`default_source_name`**: The source name used when an entry gives none
//!   (`~/.bashrc` -> `bashrc`).
//! - **`relativize`**: The target a *relative* symlink at `destination` needs in
//!   order to reach `source`.
//!
use crate::core::error::{DotlinkError, Result};
use std::path::{Component, Path, PathBuf};

/// Characters that turn a source string into a glob pattern.
const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// Expands environment variables and a leading `~` in `raw`.
///
/// # Errors
///
/// Returns `DotlinkError::InvalidPath` if `raw` is empty or references an
/// environment variable that is not set.
pub fn expand(raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(DotlinkError::InvalidPath {
            path: raw.to_string(),
            reason: "path is empty".into(),
        }
        .into());
    }

    let home_dir = || dirs::home_dir().map(|home| home.to_string_lossy().into_owned());
    let lookup = |var: &str| std::env::var(var).map(Some);

    let expanded = shellexpand::full_with_context(raw, home_dir, lookup).map_err(|e| {
        DotlinkError::InvalidPath {
            path: raw.to_string(),
            reason: format!("cannot expand ${}: {}", e.var_name, e.cause),
        }
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Collapses `.` and `..` components without consulting the filesystem.
///
/// `..` directly under the root is dropped, leading `..` components of a
/// relative path are kept, and an empty result becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Expands and cleans a configured path string.
pub fn normalize(raw: &str) -> Result<PathBuf> {
    Ok(clean(&expand(raw)?))
}

/// Anchors `path` under `base` unless it is already absolute, then cleans it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        clean(path)
    } else {
        clean(&base.join(path))
    }
}

/// Derives the source name used when an entry does not specify one.
///
/// This is the final component of `destination` with one leading dot removed,
/// so `~/.bashrc` maps to `bashrc` and `~/config` to `config`.
pub fn default_source_name(destination: &str) -> String {
    let basename = Path::new(destination)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match basename.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => basename,
    }
}

/// Returns the path from `destination`'s parent directory to `source`.
///
/// Both arguments are expected to be absolute. If no relative form exists the
/// absolute `source` is returned unchanged.
pub fn relativize(source: &Path, destination: &Path) -> PathBuf {
    let destination_dir = destination.parent().unwrap_or_else(|| Path::new("/"));
    pathdiff::diff_paths(source, destination_dir).unwrap_or_else(|| source.to_path_buf())
}

/// True if `raw` contains any glob metacharacter (`*`, `?`, `[`).
pub fn has_glob_chars(raw: &str) -> bool {
    raw.contains(GLOB_CHARS)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_name_strips_one_dot() {
        assert_eq!(default_source_name("/home/u/.bashrc"), "bashrc");
        assert_eq!(default_source_name("/home/u/config"), "config");
        assert_eq!(default_source_name("~/..hidden"), ".hidden");
    }

    #[test]
    fn test_clean_collapses_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean(Path::new("../a/b/..")), PathBuf::from("../a"));
        assert_eq!(clean(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_expand_home_and_variables() -> Result<()> {
        let home = dirs::home_dir().expect("home directory available in tests");
        assert_eq!(expand("~/.vimrc")?, home.join(".vimrc"));

        // PATH is set in every test environment we run in.
        let path_var = std::env::var("PATH")?;
        assert_eq!(expand("$PATH")?, PathBuf::from(path_var));
        Ok(())
    }

    #[test]
    fn test_expand_rejects_unknown_variable_and_empty() {
        let err = expand("$DOTLINK_SURELY_UNSET_VARIABLE/x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DotlinkError>(),
            Some(DotlinkError::InvalidPath { .. })
        ));
        assert!(expand("  ").is_err());
    }

    #[test]
    fn test_relativize_against_destination_dir() {
        let source = Path::new("/home/u/dotfiles/vimrc");
        let destination = Path::new("/home/u/.vimrc");
        assert_eq!(relativize(source, destination), PathBuf::from("dotfiles/vimrc"));

        let nested = Path::new("/home/u/.config/nvim/init.lua");
        let source = Path::new("/home/u/dotfiles/nvim/init.lua");
        assert_eq!(
            relativize(source, nested),
            PathBuf::from("../../dotfiles/nvim/init.lua")
        );
    }

    #[test]
    fn test_absolutize_and_glob_detection() {
        let base = Path::new("/srv/dots");
        assert_eq!(absolutize(Path::new("vimrc"), base), PathBuf::from("/srv/dots/vimrc"));
        assert_eq!(absolutize(Path::new("/etc/x"), base), PathBuf::from("/etc/x"));
        assert!(has_glob_chars("conf/*"));
        assert!(has_glob_chars("conf/file?.txt"));
        assert!(has_glob_chars("conf/[ab]"));
        assert!(!has_glob_chars("conf/plain"));
    }
}
