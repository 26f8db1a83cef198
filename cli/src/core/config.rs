//! # dotlink Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Two kinds of configuration live here:
//!
//! - **Link options** (`LinkOverrides` / `LinkConfig`): the per-entry flags that
//!   drive the link engine (`relative`, `force`, `backup-dir`, ...). Every layer
//!   that can set them deserializes into a `LinkOverrides` where each field is
//!   optional; layers are combined with the pure `LinkOverrides::merge` and the
//!   result is resolved once into an immutable `LinkConfig` with every default filled in.
//! - **Tool configuration** (`Config`): TOML files that tell dotlink where the
//!   mapping document lives, which base directory to use, and which link
//!   defaults apply to every mapping.
//!
//! ## Architecture
//!
//! Tool configuration sources (in order of precedence):
//! 1. Project-specific `.dotlink.toml` in the current directory or its ancestors
//!    (the search stops at a directory containing `.git`).
//! 2. User-specific `<config dir>/dotlink/config.toml`.
//! 3. Default values defined in the code.
//!
//! Link option precedence, lowest first: built-in defaults, user `[defaults]`,
//! project `[defaults]`, the mapping document's `defaults`, the entry's own record.
//!
//! ## Examples
//!
//! ```toml
//! # ~/.config/dotlink/config.toml
//! manifest = "~/dotfiles/dotlink.yaml"
//!
//! [defaults]
//! create = true
//! relink = true
//! backup-dir = "~/.local/share/dotlink/backups"
//! ```
//!
use crate::common::fs::paths;
use crate::core::error::{DotlinkError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Default name of the ledger file inside the base directory.
pub const DEFAULT_PERMS_FILE: &str = ".perms.yaml";
/// Default name of the backup directory inside the base directory.
pub const DEFAULT_BACKUP_DIR: &str = "backups";
/// Default mapping document name, relative to the current directory.
pub const DEFAULT_MANIFEST: &str = "dotlink.yaml";

const PROJECT_CONFIG_FILENAME: &str = ".dotlink.toml";
const USER_CONFIG_FILENAME: &str = "config.toml";

/// One layer of link options. Unset fields defer to the layer below.
///
/// Keys are kebab-case (`ignore-missing`); snake_case spellings are accepted too,
/// as is the legacy `canonicalize-path` key.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LinkOverrides {
    pub relative: Option<bool>,
    #[serde(alias = "canonicalize-path", alias = "canonicalize_path")]
    pub canonicalize: Option<bool>,
    pub force: Option<bool>,
    pub relink: Option<bool>,
    pub replace: Option<bool>,
    pub create: Option<bool>,
    pub glob: Option<bool>,
    pub prefix: Option<String>,
    /// Shell command gating the entry.
    #[serde(rename = "if")]
    pub condition: Option<String>,
    #[serde(alias = "ignore_missing")]
    pub ignore_missing: Option<bool>,
    pub exclude: Option<Vec<String>>,
    #[serde(alias = "store_perms")]
    pub store_perms: Option<bool>,
    #[serde(alias = "perms_file")]
    pub perms_file: Option<String>,
    pub backup: Option<bool>,
    #[serde(alias = "backup_dir")]
    pub backup_dir: Option<String>,
    pub copy: Option<bool>,
}

impl LinkOverrides {
    /// Combines two layers field by field; values set in `over` win.
    ///
    /// Pure: neither input is modified and the result does not depend on the
    /// order in which entries are processed.
    pub fn merge(&self, over: &LinkOverrides) -> LinkOverrides {
        LinkOverrides {
            relative: over.relative.or(self.relative),
            canonicalize: over.canonicalize.or(self.canonicalize),
            force: over.force.or(self.force),
            relink: over.relink.or(self.relink),
            replace: over.replace.or(self.replace),
            create: over.create.or(self.create),
            glob: over.glob.or(self.glob),
            prefix: over.prefix.clone().or_else(|| self.prefix.clone()),
            condition: over.condition.clone().or_else(|| self.condition.clone()),
            ignore_missing: over.ignore_missing.or(self.ignore_missing),
            exclude: over.exclude.clone().or_else(|| self.exclude.clone()),
            store_perms: over.store_perms.or(self.store_perms),
            perms_file: over.perms_file.clone().or_else(|| self.perms_file.clone()),
            backup: over.backup.or(self.backup),
            backup_dir: over.backup_dir.clone().or_else(|| self.backup_dir.clone()),
            copy: over.copy.or(self.copy),
        }
    }
}

/// Fully resolved, immutable options for one mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Store the link target relative to the link's directory. Default `false`.
    pub relative: bool,
    /// Resolve symlinked ancestors of the base directory. Default `true`.
    pub canonicalize: bool,
    /// Allow removing real files/directories in the way. Default `false`.
    pub force: bool,
    /// Replace links pointing elsewhere. Default `false`.
    pub relink: bool,
    /// Replace a real path at the destination when the source exists. Default `true`.
    pub replace: bool,
    /// Create the destination's parent directory. Default `false`.
    pub create: bool,
    /// Treat the source as a glob pattern. Default `false`.
    pub glob: bool,
    /// Prepended to each glob-derived destination name. Default empty.
    pub prefix: String,
    /// Shell predicate; the entry is skipped unless it exits 0. Default none.
    pub condition: Option<String>,
    /// Tolerate a missing source. Default `false`.
    pub ignore_missing: bool,
    /// Glob patterns removed from the expansion. Default empty.
    pub exclude: Vec<String>,
    /// Capture source permissions into the ledger. Default `true`.
    pub store_perms: bool,
    /// Ledger location. Default `<base>/.perms.yaml`.
    pub perms_file: PathBuf,
    /// Back up real paths before they are displaced. Default `true`.
    pub backup: bool,
    /// Backup location. Default `<base>/backups`.
    pub backup_dir: PathBuf,
    /// Copy the source instead of linking it. Default `false`.
    pub copy: bool,
}

impl LinkConfig {
    /// The built-in defaults for a given base directory.
    pub fn defaults(base: &Path) -> Self {
        LinkConfig {
            relative: false,
            canonicalize: true,
            force: false,
            relink: false,
            replace: true,
            create: false,
            glob: false,
            prefix: String::new(),
            condition: None,
            ignore_missing: false,
            exclude: Vec::new(),
            store_perms: true,
            perms_file: base.join(DEFAULT_PERMS_FILE),
            backup: true,
            backup_dir: base.join(DEFAULT_BACKUP_DIR),
            copy: false,
        }
    }

    /// Resolves merged overrides against the built-in defaults.
    ///
    /// `perms-file` and `backup-dir` are expanded (`~`, `$VAR`), cleaned, and
    /// anchored under `base` when relative.
    ///
    /// # Errors
    ///
    /// Returns `DotlinkError::InvalidPath` if a configured path cannot be expanded.
    pub fn resolve(base: &Path, overrides: &LinkOverrides) -> Result<Self> {
        let defaults = Self::defaults(base);
        let resolve_path = |raw: &Option<String>, fallback: PathBuf| -> Result<PathBuf> {
            match raw {
                Some(raw) => Ok(paths::absolutize(&paths::normalize(raw)?, base)),
                None => Ok(fallback),
            }
        };

        Ok(LinkConfig {
            relative: overrides.relative.unwrap_or(defaults.relative),
            canonicalize: overrides.canonicalize.unwrap_or(defaults.canonicalize),
            force: overrides.force.unwrap_or(defaults.force),
            relink: overrides.relink.unwrap_or(defaults.relink),
            replace: overrides.replace.unwrap_or(defaults.replace),
            create: overrides.create.unwrap_or(defaults.create),
            glob: overrides.glob.unwrap_or(defaults.glob),
            prefix: overrides.prefix.clone().unwrap_or(defaults.prefix),
            condition: overrides.condition.clone().or(defaults.condition),
            ignore_missing: overrides.ignore_missing.unwrap_or(defaults.ignore_missing),
            exclude: overrides.exclude.clone().unwrap_or(defaults.exclude),
            store_perms: overrides.store_perms.unwrap_or(defaults.store_perms),
            perms_file: resolve_path(&overrides.perms_file, defaults.perms_file)?,
            backup: overrides.backup.unwrap_or(defaults.backup),
            backup_dir: resolve_path(&overrides.backup_dir, defaults.backup_dir)?,
            copy: overrides.copy.unwrap_or(defaults.copy),
        })
    }
}

/// Tool configuration loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path of the mapping document (can use ~). Will be expanded.
    pub manifest: Option<String>,
    /// Base directory sources are resolved against (can use ~). Will be expanded.
    pub base_dir: Option<String>,
    /// Link option defaults applied beneath every mapping document.
    #[serde(default)]
    pub defaults: LinkOverrides,
}

impl Config {
    /// The mapping document path, falling back to `dotlink.yaml`.
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(self.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST))
    }
}

/// Loads, merges, expands and validates the user and project configuration.
pub fn load_config() -> Result<Config> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    load_config_from(user_config_path().as_deref(), &current_dir)
}

/// Same as `load_config`, with an explicit user file and project search start.
pub fn load_config_from(user_path: Option<&Path>, start_dir: &Path) -> Result<Config> {
    let user_config = match user_path {
        Some(path) if path.is_file() => {
            info!("Loading user configuration from: {}", path.display());
            Some(load_config_from_path(path)?)
        }
        Some(path) => {
            debug!("User configuration file not found at {}", path.display());
            None
        }
        None => None,
    };

    let project_config = match find_project_config_path(start_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        None => {
            debug!("No project configuration file (.dotlink.toml) found.");
            None
        }
    };

    let mut merged = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged).context("Failed to expand paths in configuration")?;
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

fn user_config_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "dotlink", "dotlink") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().join(USER_CONFIG_FILENAME)),
        None => {
            warn!("Could not determine user config directory.");
            None
        }
    }
}

fn find_project_config_path(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        let project_config = dir.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if dir.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                dir.display()
            );
            return None;
        }
    }
    None
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let Some(project) = project else {
        return user;
    };
    Config {
        manifest: project.manifest.or(user.manifest),
        base_dir: project.base_dir.or(user.base_dir),
        defaults: user.defaults.merge(&project.defaults),
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(manifest) = &config.manifest {
        config.manifest = Some(shellexpand::tilde(manifest).into_owned());
    }
    if let Some(base_dir) = &config.base_dir {
        config.base_dir = Some(shellexpand::tilde(base_dir).into_owned());
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    if config.manifest.as_deref().is_some_and(|m| m.trim().is_empty()) {
        return Err(anyhow!(DotlinkError::Config(
            "The 'manifest' path cannot be empty.".to_string()
        )));
    }
    if let Some(base_dir) = &config.base_dir {
        let base = PathBuf::from(base_dir);
        if !base.exists() {
            warn!("Configured base directory '{}' does not exist.", base.display());
        } else if !base.is_dir() {
            return Err(anyhow!(DotlinkError::Config(format!(
                "Configured base directory '{}' exists but is not a directory.",
                base.display()
            ))));
        }
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_documented_values() {
        let base = Path::new("/dots");
        let cfg = LinkConfig::resolve(base, &LinkOverrides::default()).unwrap();
        assert_eq!(cfg, LinkConfig::defaults(base));
        assert!(cfg.canonicalize && cfg.replace && cfg.store_perms && cfg.backup);
        assert!(!cfg.relative && !cfg.force && !cfg.relink && !cfg.create && !cfg.glob);
        assert_eq!(cfg.perms_file, PathBuf::from("/dots/.perms.yaml"));
        assert_eq!(cfg.backup_dir, PathBuf::from("/dots/backups"));
    }

    #[test]
    fn test_merge_is_per_field() {
        let defaults = LinkOverrides {
            create: Some(true),
            force: Some(true),
            prefix: Some(".".into()),
            ..Default::default()
        };
        let entry = LinkOverrides {
            force: Some(false),
            exclude: Some(vec!["conf/b".into()]),
            ..Default::default()
        };
        let merged = defaults.merge(&entry);
        assert_eq!(merged.create, Some(true));
        assert_eq!(merged.force, Some(false));
        assert_eq!(merged.prefix.as_deref(), Some("."));
        assert_eq!(merged.exclude, Some(vec!["conf/b".to_string()]));
        // Inputs are untouched.
        assert_eq!(defaults.force, Some(true));
    }

    #[test]
    fn test_deserialize_kebab_snake_and_legacy_keys() {
        let yaml = r#"
            ignore-missing: true
            store_perms: false
            canonicalize-path: false
            if: "test -d ~/.config"
            backup-dir: "~/backups"
            exclude: ["conf/b"]
        "#;
        let parsed: LinkOverrides = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.ignore_missing, Some(true));
        assert_eq!(parsed.store_perms, Some(false));
        assert_eq!(parsed.canonicalize, Some(false));
        assert_eq!(parsed.condition.as_deref(), Some("test -d ~/.config"));
        assert_eq!(parsed.exclude.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_unknown_link_option_is_rejected() {
        let parsed: std::result::Result<LinkOverrides, _> = serde_yaml::from_str("forse: true");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_resolve_anchors_relative_paths() -> Result<()> {
        let overrides = LinkOverrides {
            perms_file: Some("state/perms.yaml".into()),
            backup_dir: Some("/var/tmp/bk/../bk2".into()),
            ..Default::default()
        };
        let cfg = LinkConfig::resolve(Path::new("/dots"), &overrides)?;
        assert_eq!(cfg.perms_file, PathBuf::from("/dots/state/perms.yaml"));
        assert_eq!(cfg.backup_dir, PathBuf::from("/var/tmp/bk2"));
        Ok(())
    }

    #[test]
    fn test_deserialize_tool_config_toml() {
        let toml_content = r#"
            manifest = "~/dotfiles/dotlink.yaml"

            [defaults]
            create = true
            relink = true
            backup-dir = "~/.local/share/dotlink/backups"
        "#;
        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");
        assert_eq!(config.manifest.as_deref(), Some("~/dotfiles/dotlink.yaml"));
        assert_eq!(config.defaults.create, Some(true));
        assert_eq!(config.defaults.relink, Some(true));
        assert_eq!(config.base_dir, None);
    }

    #[test]
    fn test_load_config_project_overrides_user() -> Result<()> {
        let dir = tempdir()?;
        let user = dir.path().join("user.toml");
        fs::write(
            &user,
            "manifest = \"user.yaml\"\n[defaults]\ncreate = true\nforce = true\n",
        )?;
        let project_root = dir.path().join("project");
        fs::create_dir_all(project_root.join(".git"))?;
        fs::create_dir_all(project_root.join("nested"))?;
        fs::write(
            project_root.join(PROJECT_CONFIG_FILENAME),
            "manifest = \"project.yaml\"\n[defaults]\nforce = false\n",
        )?;

        let config = load_config_from(Some(&user), &project_root.join("nested"))?;
        assert_eq!(config.manifest.as_deref(), Some("project.yaml"));
        assert_eq!(config.defaults.create, Some(true));
        assert_eq!(config.defaults.force, Some(false));
        Ok(())
    }

    #[test]
    fn test_project_search_stops_at_git_root() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(PROJECT_CONFIG_FILENAME), "manifest = \"outer.yaml\"\n")?;
        let repo = dir.path().join("repo");
        fs::create_dir_all(repo.join(".git"))?;
        assert_eq!(find_project_config_path(&repo), None);
        Ok(())
    }

    #[test]
    fn test_validate_config_base_dir_is_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("not_a_dir");
        fs::write(&file_path, "")?;
        let config = Config {
            base_dir: Some(file_path.to_string_lossy().to_string()),
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("is not a directory"));

        let empty = Config {
            manifest: Some(" ".into()),
            ..Default::default()
        };
        assert!(validate_config(&empty).is_err());
        Ok(())
    }
}
