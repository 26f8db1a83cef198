//! # dotlink Mapping Document
//!
//! File: cli/src/core/manifest.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Loads the YAML mapping document that declares which links should exist.
//!
//! ```yaml
//! defaults:
//!   create: true
//!   relink: true
//!
//! link:
//!   ~/.vimrc: vimrc            # explicit source
//!   ~/.bashrc:                 # source derived from the name: "bashrc"
//!   ~/.config/:
//!     path: config/*
//!     glob: true
//!     exclude: [config/secrets]
//! ```
//!
//! ## Architecture
//!
//! The document is first read as an untyped `serde_yaml::Value` so that the
//! order of the `link` mapping is kept (entries are processed in document order)
//! and so each entry record can be split into its `path` and its link options.
//! Link options go through `LinkOverrides`, which rejects unknown keys before
//! any filesystem work starts.
//!
use crate::common::fs::paths;
use crate::core::config::LinkOverrides;
use crate::core::error::{DotlinkError, Result};
use anyhow::Context;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One declared link: destination, optional source, and its own option layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Where the link is created, as written in the document.
    pub destination: String,
    /// The source path or glob pattern, if given.
    pub source: Option<String>,
    /// Options set on this entry only.
    pub overrides: LinkOverrides,
}

impl LinkSpec {
    /// The explicit source, or the name derived from the destination.
    pub fn source_or_default(&self) -> String {
        match &self.source {
            Some(source) => source.clone(),
            None => paths::default_source_name(&self.destination),
        }
    }
}

/// A parsed mapping document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// File the document was read from (empty when parsed from a string).
    pub path: PathBuf,
    /// Link option defaults declared by the document.
    pub defaults: LinkOverrides,
    /// Entries in document order.
    pub entries: Vec<LinkSpec>,
}

impl Manifest {
    /// Directory containing the document; the default base directory.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }
}

/// Reads and parses the mapping document at `path`.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping document: {}", path.display()))?;
    let mut manifest = parse_manifest(&text)
        .with_context(|| format!("Invalid mapping document: {}", path.display()))?;
    manifest.path = path.to_path_buf();
    debug!(
        "Loaded {} link entries from {}",
        manifest.entries.len(),
        path.display()
    );
    Ok(manifest)
}

/// Parses a mapping document from YAML text.
pub fn parse_manifest(text: &str) -> Result<Manifest> {
    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| DotlinkError::Manifest(format!("not valid YAML: {}", e)))?;

    let top = match document {
        Value::Null => Mapping::new(),
        Value::Mapping(top) => top,
        other => {
            return Err(DotlinkError::Manifest(format!(
                "expected a mapping at the top level, found {}",
                describe(&other)
            ))
            .into())
        }
    };

    let mut defaults = LinkOverrides::default();
    let mut entries = Vec::new();
    for (key, value) in top {
        match key.as_str() {
            Some("defaults") => {
                if !value.is_null() {
                    defaults = serde_yaml::from_value(value).map_err(|e| {
                        DotlinkError::Manifest(format!("invalid defaults: {}", e))
                    })?;
                }
            }
            Some("link") => entries = parse_links(value)?,
            _ => {
                return Err(DotlinkError::Manifest(format!(
                    "unknown top-level key {:?} (expected 'defaults' or 'link')",
                    key
                ))
                .into())
            }
        }
    }

    Ok(Manifest {
        path: PathBuf::new(),
        defaults,
        entries,
    })
}

fn parse_links(value: Value) -> Result<Vec<LinkSpec>> {
    let links = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(links) => links,
        other => {
            return Err(DotlinkError::Manifest(format!(
                "'link' must be a mapping of destination to source, found {}",
                describe(&other)
            ))
            .into())
        }
    };

    links
        .into_iter()
        .map(|(key, value)| {
            let destination = key
                .as_str()
                .ok_or_else(|| {
                    DotlinkError::Manifest(format!("link destination {:?} is not a string", key))
                })?
                .to_string();
            parse_entry(destination, value)
        })
        .collect()
}

fn parse_entry(destination: String, value: Value) -> Result<LinkSpec> {
    match value {
        Value::Null => Ok(LinkSpec {
            destination,
            source: None,
            overrides: LinkOverrides::default(),
        }),
        Value::String(source) => Ok(LinkSpec {
            destination,
            source: Some(source),
            overrides: LinkOverrides::default(),
        }),
        Value::Mapping(mut record) => {
            let source = match record.remove("path") {
                None | Some(Value::Null) => None,
                Some(Value::String(path)) => Some(path),
                Some(other) => {
                    return Err(DotlinkError::Manifest(format!(
                        "'path' of {} must be a string, found {}",
                        destination,
                        describe(&other)
                    ))
                    .into())
                }
            };
            let overrides = serde_yaml::from_value(Value::Mapping(record)).map_err(|e| {
                DotlinkError::Manifest(format!("invalid options for {}: {}", destination, e))
            })?;
            Ok(LinkSpec {
                destination,
                source,
                overrides,
            })
        }
        other => Err(DotlinkError::Manifest(format!(
            "entry {} must be a source path or an option record, found {}",
            destination,
            describe(&other)
        ))
        .into()),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_all_entry_forms_in_order() -> Result<()> {
        let manifest = parse_manifest(
            r#"
defaults:
  create: true
link:
  ~/.vimrc: vimrc
  ~/.bashrc:
  ~/.config/:
    path: config/*
    glob: true
    exclude: [config/b]
  ~/.profile:
    relink: true
"#,
        )?;
        assert_eq!(manifest.defaults.create, Some(true));
        let destinations: Vec<_> = manifest.entries.iter().map(|e| e.destination.as_str()).collect();
        assert_eq!(destinations, ["~/.vimrc", "~/.bashrc", "~/.config/", "~/.profile"]);

        assert_eq!(manifest.entries[0].source.as_deref(), Some("vimrc"));
        assert_eq!(manifest.entries[1].source_or_default(), "bashrc");
        assert_eq!(manifest.entries[2].source.as_deref(), Some("config/*"));
        assert_eq!(manifest.entries[2].overrides.glob, Some(true));
        assert_eq!(manifest.entries[3].source_or_default(), "profile");
        assert_eq!(manifest.entries[3].overrides.relink, Some(true));
        Ok(())
    }

    #[test]
    fn test_empty_document_has_no_entries() -> Result<()> {
        assert!(parse_manifest("")?.entries.is_empty());
        assert!(parse_manifest("link:\n")?.entries.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_shapes() {
        assert!(parse_manifest("links: {}").is_err());
        assert!(parse_manifest("link: [a, b]").is_err());
        assert!(parse_manifest("link:\n  ~/.x:\n    forse: true\n").is_err());
        assert!(parse_manifest("link:\n  ~/.x: 3\n").is_err());
        assert!(parse_manifest("- not a mapping").is_err());
    }

    #[test]
    fn test_load_manifest_records_path() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dotlink.yaml");
        fs::write(&path, "link:\n  ~/.vimrc: vimrc\n")?;
        let manifest = load_manifest(&path)?;
        assert_eq!(manifest.directory(), Some(dir.path()));
        assert_eq!(manifest.entries.len(), 1);
        Ok(())
    }
}
