//! Manager configuration module.
//!
//! Handles loading, validating, and merging `gallery.toml`. The file lives in
//! the site root (the directory passed as `--root`); every path in it is
//! relative to that root, so nothing machine-specific is compiled in.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! document = "index.html"        # Page holding the gallery
//! container_id = "gallery-grid"  # id of the element holding the cards
//!
//! [assets]
//! dir = "assets/gallery"         # Where imported card images go
//! fallback_image = "./assets/logo.png"
//! max_dimension = 1200           # Longer edge cap for imported images
//! quality = 85                   # JPEG quality (1-100)
//!
//! [backup]
//! dir = "backups"
//! on_failure = "continue"        # or "abort"
//!
//! [publish]
//! git = "git"
//! remote = "origin"
//! main_branch = "main"
//! commit_message = "Update gallery via Gallery Manager"
//! command_timeout_secs = 30
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [publish]
//! main_branch = "production"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::backup::BackupPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the site root.
pub const CONFIG_FILE: &str = "gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Manager configuration loaded from `gallery.toml`.
///
/// All fields have defaults matching a stock storefront layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Gallery page, relative to the site root.
    pub document: PathBuf,
    /// `id` attribute of the card container element.
    pub container_id: String,
    /// Card image import settings.
    pub assets: AssetsConfig,
    /// Snapshot settings.
    pub backup: BackupConfig,
    /// Git publishing settings.
    pub publish: PublishConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from("index.html"),
            container_id: "gallery-grid".to_string(),
            assets: AssetsConfig::default(),
            backup: BackupConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "container_id must not be empty".into(),
            ));
        }
        if self.assets.quality == 0 || self.assets.quality > 100 {
            return Err(ConfigError::Validation(
                "assets.quality must be 1-100".into(),
            ));
        }
        if self.assets.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "assets.max_dimension must be non-zero".into(),
            ));
        }
        if self.publish.command_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "publish.command_timeout_secs must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("publish.git", &self.publish.git),
            ("publish.remote", &self.publish.remote),
            ("publish.main_branch", &self.publish.main_branch),
            ("publish.commit_message", &self.publish.commit_message),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Card image import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Image directory, relative to the site root. Also staged on publish.
    pub dir: PathBuf,
    /// Shown by the browser when a card image fails to load.
    pub fallback_image: String,
    /// Imported images are downscaled so the longer edge fits this.
    pub max_dimension: u32,
    /// JPEG quality for imported images.
    pub quality: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets/gallery"),
            fallback_image: "./assets/logo.png".to_string(),
            max_dimension: 1200,
            quality: 85,
        }
    }
}

/// Snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Backup directory, relative to the site root.
    pub dir: PathBuf,
    /// What a mutation does when the snapshot fails.
    pub on_failure: BackupPolicy,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backups"),
            on_failure: BackupPolicy::Continue,
        }
    }
}

/// Git publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Git binary, looked up on `PATH` unless absolute.
    pub git: String,
    pub remote: String,
    /// Branch the live site deploys from.
    pub main_branch: String,
    pub commit_message: String,
    /// Ceiling for each git invocation.
    pub command_timeout_secs: u64,
}

impl PublishConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            remote: "origin".to_string(),
            main_branch: "main".to_string(),
            commit_message: "Update gallery via Gallery Manager".to_string(),
            command_timeout_secs: 30,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ManagerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ManagerConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ManagerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `gallery.toml` from the site root, or from `explicit` when given.
///
/// A missing root config means stock defaults; a missing explicit file is an error.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ManagerConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(toml::from_str(&fs::read_to_string(path)?)?),
        None => load_raw_config(&root.join(CONFIG_FILE))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `gallery.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Manager Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the site root.
# Unknown keys will cause an error.

# Page that holds the product gallery.
document = "index.html"

# id attribute of the element that contains the gallery cards.
container_id = "gallery-grid"

# ---------------------------------------------------------------------------
# Card images
# ---------------------------------------------------------------------------
[assets]
# Imported images are written here as <type>-<id>.jpg. Staged on publish.
dir = "assets/gallery"

# Image the browser falls back to when a card image fails to load.
fallback_image = "./assets/logo.png"

# Imported images are downscaled so the longer edge is at most this many pixels.
max_dimension = 1200

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Backups
# ---------------------------------------------------------------------------
[backup]
# A timestamped copy of the page is written here before every change.
dir = "backups"

# "continue": report a failed backup and apply the change anyway.
# "abort":    refuse to change the page when the backup fails.
on_failure = "continue"

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publish]
git = "git"
remote = "origin"

# When publishing from another branch, it is merged into this one and pushed.
main_branch = "main"

commit_message = "Update gallery via Gallery Manager"

# Each git command is killed after this many seconds.
command_timeout_secs = 30
"##
}
