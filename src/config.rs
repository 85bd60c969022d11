//! Compiler configuration.
//!
//! Handles loading, validating, and merging the optional `bookdir.toml` that
//! lives in the input root. The file is sparse: stock defaults are the base
//! layer and the user file only needs the keys it wants to change.
//!
//! ```text
//! scans/
//! ├── bookdir.toml             # Optional, root level only
//! ├── book.title               # Document title override
//! ├── 01. Front Matter/
//! │   └── cover.jpg
//! └── 02. Chapter One/
//!     ├── chapter.title        # Bookmark rename override
//!     ├── 001.png
//!     └── 002.png
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # order_separator = "."      # Strip "01." style prefixes from bookmark titles
//! path_length_warning = 240     # Warn when an absolute path reaches this many bytes
//!
//! [extensions]
//! pages = ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "webp"]
//! ignored = ["ignore", "db"]
//!
//! [overrides]
//! title = "title"               # <name>.title renames the directory's bookmark
//! author = "author"             # <name>.author sets the document author (root only)
//! dpi = "dpi"                   # <name>.dpi sets the page DPI (root only)
//!
//! [processing]
//! max_processes = 4             # Max parallel dimension probes (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Command-line values take
//! precedence over anything set here.

use crate::metadata::OverrideKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the input root.
pub const CONFIG_FILE: &str = "bookdir.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compiler configuration loaded from `bookdir.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// Character separating an ordering prefix from the bookmark title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_separator: Option<String>,
    /// Absolute path length (bytes) at which a warning is emitted.
    pub path_length_warning: usize,
    /// Which file extensions are pages and which are silently ignored.
    pub extensions: ExtensionsConfig,
    /// File extensions recognized as metadata override files.
    pub overrides: OverrideFilesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            order_separator: None,
            path_length_warning: 240,
            extensions: ExtensionsConfig::default(),
            overrides: OverrideFilesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl BookConfig {
    /// Validate values and check that no extension belongs to two classes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sep) = &self.order_separator
            && sep.is_empty()
        {
            return Err(ConfigError::Validation(
                "order_separator must not be empty".into(),
            ));
        }
        if self.path_length_warning == 0 {
            return Err(ConfigError::Validation(
                "path_length_warning must be non-zero".into(),
            ));
        }
        if self.extensions.pages.is_empty() {
            return Err(ConfigError::Validation(
                "extensions.pages must not be empty".into(),
            ));
        }

        let mut seen: Vec<(String, &str)> = Vec::new();
        let override_exts = [
            (&self.overrides.title, "overrides.title"),
            (&self.overrides.author, "overrides.author"),
            (&self.overrides.dpi, "overrides.dpi"),
        ];
        let all = self
            .extensions
            .pages
            .iter()
            .map(|e| (e, "extensions.pages"))
            .chain(self.extensions.ignored.iter().map(|e| (e, "extensions.ignored")))
            .chain(override_exts);
        for (ext, key) in all {
            let ext = normalize_extension(ext);
            if ext.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key} contains an empty extension"
                )));
            }
            if let Some((_, other)) = seen.iter().find(|(e, _)| *e == ext) {
                return Err(ConfigError::Validation(format!(
                    "extension '{ext}' appears in both {other} and {key}"
                )));
            }
            seen.push((ext, key));
        }
        Ok(())
    }
}

/// Page and ignored file extensions, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionsConfig {
    pub pages: Vec<String>,
    pub ignored: Vec<String>,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            pages: ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "webp"]
                .map(String::from)
                .to_vec(),
            ignored: vec!["ignore".to_string(), "db".to_string()],
        }
    }
}

impl ExtensionsConfig {
    pub fn is_page(&self, ext: &str) -> bool {
        contains_extension(&self.pages, ext)
    }

    pub fn is_ignored(&self, ext: &str) -> bool {
        contains_extension(&self.ignored, ext)
    }
}

/// Extensions of the three override file kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverrideFilesConfig {
    pub title: String,
    pub author: String,
    pub dpi: String,
}

impl Default for OverrideFilesConfig {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            author: "author".to_string(),
            dpi: "dpi".to_string(),
        }
    }
}

impl OverrideFilesConfig {
    /// Map a file extension to the override kind it declares, if any.
    pub fn kind_for(&self, ext: &str) -> Option<OverrideKind> {
        let ext = normalize_extension(ext);
        if ext == normalize_extension(&self.title) {
            Some(OverrideKind::Rename)
        } else if ext == normalize_extension(&self.author) {
            Some(OverrideKind::Author)
        } else if ext == normalize_extension(&self.dpi) {
            Some(OverrideKind::Dpi)
        } else {
            None
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel dimension probes.
    /// When absent, defaults to the number of CPU cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Lowercase an extension and drop a leading dot, so `".JPG"` matches `"jpg"`.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn contains_extension(list: &[String], ext: &str) -> bool {
    let ext = normalize_extension(ext);
    list.iter().any(|e| normalize_extension(e) == ext)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BookConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Load `bookdir.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BookConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BookConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `bookdir.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<BookConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `bookdir.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# bookdir configuration
# =====================
# Place this file in the root of the image directory you compile.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Character separating an ordering prefix from the bookmark title.
# With "." the directory "02. Chapter Two" becomes the bookmark "Chapter Two".
# order_separator = "."

# Warn when an absolute path reaches this many bytes. Some filesystems
# and PDF tools choke on paths near 260 characters.
path_length_warning = 240

[extensions]
# Files with these extensions become pages, in alphabetical order.
pages = ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "webp"]
# Files with these extensions are skipped without a warning.
ignored = ["ignore", "db"]

[overrides]
# A file "<anything>.title" renames the bookmark of its directory.
# In the root directory it sets the document title instead.
title = "title"
# A file "<anything>.author" in the root directory sets the document author.
author = "author"
# A file "<anything>.dpi" in the root directory sets the page resolution.
dpi = "dpi"

[processing]
# Maximum parallel workers for page dimension probing.
# Omit for auto (number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_extension_sets() {
        let config = BookConfig::default();
        assert!(config.extensions.is_page("jpg"));
        assert!(config.extensions.is_page("PNG"));
        assert!(config.extensions.is_ignored("db"));
        assert!(!config.extensions.is_page("txt"));
        assert_eq!(config.order_separator, None);
        assert_eq!(config.path_length_warning, 240);
    }

    #[test]
    fn override_kinds_from_extensions() {
        let overrides = OverrideFilesConfig::default();
        assert_eq!(overrides.kind_for("title"), Some(OverrideKind::Rename));
        assert_eq!(overrides.kind_for("AUTHOR"), Some(OverrideKind::Author));
        assert_eq!(overrides.kind_for(".dpi"), Some(OverrideKind::Dpi));
        assert_eq!(overrides.kind_for("txt"), None);
    }

    #[test]
    fn parse_partial_config() {
        let config: BookConfig = toml::from_str(
            r#"
order_separator = ")"

[extensions]
ignored = ["db", "txt"]
"#,
        )
        .unwrap();
        assert_eq!(config.order_separator.as_deref(), Some(")"));
        assert!(config.extensions.is_ignored("txt"));
        // Defaults preserved
        assert!(config.extensions.is_page("jpeg"));
        assert_eq!(config.overrides.title, "title");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.path_length_warning, 240);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "order_separator = \".\"\npath_length_warning = 100\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.order_separator.as_deref(), Some("."));
        assert_eq!(config.path_length_warning, 100);
        assert_eq!(config.overrides.dpi, "dpi");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[extensions]\npagez = [\"jpg\"]\n",
        )
        .unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn empty_separator_rejected() {
        let config = BookConfig {
            order_separator: Some(String::new()),
            ..BookConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn extension_in_two_classes_rejected() {
        let mut config = BookConfig::default();
        config.extensions.ignored.push("JPG".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("jpg"));
        assert!(err.contains("extensions.ignored"));
    }

    #[test]
    fn override_extension_colliding_with_page_rejected() {
        let mut config = BookConfig::default();
        config.overrides.title = "png".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_page_set_rejected() {
        let mut config = BookConfig::default();
        config.extensions.pages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[overrides]\ntitle = \"name\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let overrides = merged.get("overrides").unwrap();
        assert_eq!(overrides.get("title").unwrap().as_str(), Some("name"));
        assert_eq!(overrides.get("author").unwrap().as_str(), Some("author"));
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: BookConfig = toml::from_str(stock_config_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.path_length_warning, 240);
        assert_eq!(config.extensions.pages.len(), 8);
        assert_eq!(config.overrides.author, "author");
        assert_eq!(config.order_separator, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.get("extensions").is_some());
        assert!(val.get("overrides").is_some());
        assert!(val.get("processing").is_some());
    }
}
