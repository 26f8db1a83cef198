//! # Glob Expansion
//!
//! File: cli/src/commands/link/expand.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Fans a single globbed entry out into one concrete (source, destination) pair
//! per matching path.
//!
//! ## Architecture
//!
//! 1. The include pattern and every exclude pattern are expanded independently
//!    with the `glob` crate (`**` matches zero or more directories; a leading `.`
//!    in a name must be matched literally).
//! 2. Results are filtered by the pattern's shape: a pattern ending in a path
//!    separator yields directories only; a pattern containing `**` that does not
//!    end in a separator yields regular files only, so no links to whole
//!    directories are created by accident.
//! 3. The exclusions are subtracted as a set. `BTreeSet` keeps the surviving
//!    matches sorted, which makes runs reproducible.
//! 4. Each survivor keeps its sub-path below the pattern's fixed prefix: the
//!    anchor directory plus the pattern's leading wildcard-free components. That
//!    sub-path, with the configured prefix prepended, is joined under the entry's
//!    destination.
//!
//! Relative patterns are anchored at the base directory through `GlobPattern`.
//! The anchor is escaped with `glob::Pattern::escape`, so a base directory
//! whose name contains `[`, `*` or `?` is matched literally.
//!
use crate::common::fs::paths;
use crate::core::error::{DotlinkError, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// One concrete link produced by a glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    /// Absolute path of the matched source.
    pub source: PathBuf,
    /// Absolute path the link for this match is created at.
    pub destination: PathBuf,
}

/// A source pattern anchored at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    /// Pattern text handed to `glob`, with the anchor escaped.
    pattern: String,
    /// Unescaped directory every match of the pattern lies below.
    fixed_prefix: PathBuf,
}

impl GlobPattern {
    /// Expands `~`/variables in `raw` and anchors it at `anchor` when relative.
    ///
    /// A trailing separator on `raw` is kept, since it selects directories.
    ///
    /// # Errors
    ///
    /// Returns `DotlinkError::InvalidPath` if `raw` cannot be expanded.
    pub fn anchored(raw: &str, anchor: &Path) -> Result<Self> {
        let expanded = paths::expand(raw)?;
        let expanded_text = expanded.to_string_lossy().into_owned();
        let fixed: PathBuf = expanded
            .components()
            .take_while(|component| !is_wildcard(component))
            .collect();

        let (mut pattern, fixed_prefix) = if expanded.is_absolute() {
            (expanded_text, paths::clean(&fixed))
        } else {
            let mut escaped = Pattern::escape(&anchor.to_string_lossy());
            if !escaped.ends_with(['/', MAIN_SEPARATOR]) {
                escaped.push(MAIN_SEPARATOR);
            }
            escaped.push_str(&expanded_text);
            (escaped, paths::clean(&anchor.join(fixed)))
        };

        let wants_dirs = raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR);
        if wants_dirs && !pattern.ends_with(['/', MAIN_SEPARATOR]) {
            pattern.push(MAIN_SEPARATOR);
        }
        Ok(GlobPattern {
            pattern,
            fixed_prefix,
        })
    }

    /// The pattern text as passed to `glob`.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Expands `include` minus `excludes` into concrete links under `destination`.
///
/// # Errors
///
/// Returns `DotlinkError::Glob` if any pattern is syntactically invalid.
pub fn expand(
    include: &GlobPattern,
    excludes: &[GlobPattern],
    destination: &Path,
    prefix: &str,
) -> Result<Vec<GlobMatch>> {
    debug!("Globbing with pattern: {}", include.as_str());
    let found = glob_paths(include.as_str())?;
    debug!("Glob found: {:?}", found);

    let mut exclude = BTreeSet::new();
    for exclude_pattern in excludes {
        debug!("Excluding globs with pattern: {}", exclude_pattern.as_str());
        exclude.extend(glob_paths(exclude_pattern.as_str())?);
    }
    debug!("Excluded globs from '{}': {:?}", include.as_str(), exclude);

    let matches = found
        .difference(&exclude)
        .map(|source| {
            let sub_path = sub_path_below(&include.fixed_prefix, source);
            GlobMatch {
                source: source.clone(),
                destination: destination.join(format!("{}{}", prefix, sub_path)),
            }
        })
        .collect();
    Ok(matches)
}

/// Expands one pattern into a set of cleaned paths, applying the shape filter.
fn glob_paths(pattern: &str) -> Result<BTreeSet<PathBuf>> {
    let dirs_only = pattern.ends_with(MAIN_SEPARATOR) || pattern.ends_with('/');
    let files_only = !dirs_only && pattern.contains("**");
    let trimmed = pattern.trim_end_matches(['/', MAIN_SEPARATOR]);

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let entries = glob::glob_with(trimmed, options).map_err(|e| DotlinkError::Glob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut found = BTreeSet::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if files_only && !path.is_file() {
                    continue;
                }
                if dirs_only && !path.is_dir() {
                    continue;
                }
                found.insert(paths::clean(&path));
            }
            // Unreadable directories are skipped, like a shell glob would.
            Err(e) => debug!("Skipping unreadable glob entry: {}", e),
        }
    }
    if files_only {
        debug!("Excluded directories from recursive glob: {}", pattern);
    }
    Ok(found)
}

/// The part of `matched` below `fixed_prefix`, or its file name when the match
/// is the prefix itself (e.g. `dir/**/`).
fn sub_path_below(fixed_prefix: &Path, matched: &Path) -> String {
    match matched.strip_prefix(fixed_prefix) {
        Ok(sub_path) if !sub_path.as_os_str().is_empty() => {
            sub_path.to_string_lossy().into_owned()
        }
        _ => matched
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn is_wildcard(component: &Component) -> bool {
    paths::has_glob_chars(&component.as_os_str().to_string_lossy())
}
