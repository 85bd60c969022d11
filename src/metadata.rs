//! Per-directory metadata overrides.
//!
//! Any directory may carry small text files that override what would
//! otherwise be derived from the filesystem. The file's extension selects the
//! kind of override; its stem is irrelevant (`chapter.title`, `x.title` and
//! `.title` with a stem are all rename overrides):
//!
//! | Extension | Override | Scope |
//! |-----------|----------|-------|
//! | `.title`  | Rename the directory's bookmark | per directory (root: document title) |
//! | `.author` | Document author | root directory only |
//! | `.dpi`    | Page resolution | root directory only |
//!
//! The value is the first non-empty line of the file, trimmed. A directory
//! may hold at most one override of each kind; the scanner turns a second one
//! into a hard error because there is no sensible way to pick a winner.
//!
//! ## Resolution priority
//!
//! - **Bookmark title**: rename override → separator-stripped name → raw name
//! - **Author / DPI**: explicit caller value → root override file → none
//!
//! When an explicit value shadows a file override the caller gets a
//! warning, not an error.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The three recognized override kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    Rename,
    Author,
    Dpi,
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverrideKind::Rename => "rename",
            OverrideKind::Author => "author",
            OverrideKind::Dpi => "dpi",
        };
        f.write_str(name)
    }
}

/// A parsed override directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Override {
    Rename(String),
    Author(String),
    Dpi(u32),
}

impl Override {
    pub fn kind(&self) -> OverrideKind {
        match self {
            Override::Rename(_) => OverrideKind::Rename,
            Override::Author(_) => OverrideKind::Author,
            Override::Dpi(_) => OverrideKind::Dpi,
        }
    }

    /// Parse the textual value of an override file.
    pub fn parse(kind: OverrideKind, value: &str) -> Result<Override, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("override file has no content".to_string());
        }
        match kind {
            OverrideKind::Rename => Ok(Override::Rename(value.to_string())),
            OverrideKind::Author => Ok(Override::Author(value.to_string())),
            OverrideKind::Dpi => match value.parse::<u32>() {
                Ok(dpi) if dpi > 0 => Ok(Override::Dpi(dpi)),
                _ => Err(format!("'{value}' is not a positive integer DPI")),
            },
        }
    }
}

/// Read the first non-empty line of an override file, trimmed.
///
/// Returns `Ok(None)` for a file that is empty or whitespace only.
pub fn read_first_line(path: &Path) -> std::io::Result<Option<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from))
}

/// Overrides found in a single directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

/// All overrides of a scanned tree, keyed by absolute directory path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    root: PathBuf,
    by_dir: BTreeMap<PathBuf, DirOverrides>,
}

impl Overrides {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            by_dir: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record an override for `dir`.
    ///
    /// Returns the kind back as the error when `dir` already has an override
    /// of that kind; the existing value is left untouched.
    pub fn insert(&mut self, dir: &Path, value: Override) -> Result<(), OverrideKind> {
        let slot = self.by_dir.entry(dir.to_path_buf()).or_default();
        let kind = value.kind();
        let occupied = match &value {
            Override::Rename(_) => slot.rename.is_some(),
            Override::Author(_) => slot.author.is_some(),
            Override::Dpi(_) => slot.dpi.is_some(),
        };
        if occupied {
            return Err(kind);
        }
        match value {
            Override::Rename(text) => slot.rename = Some(text),
            Override::Author(text) => slot.author = Some(text),
            Override::Dpi(dpi) => slot.dpi = Some(dpi),
        }
        Ok(())
    }

    /// Overrides declared directly in `dir`, if any.
    pub fn get(&self, dir: &Path) -> Option<&DirOverrides> {
        self.by_dir.get(dir)
    }

    /// Bookmark rename for the directory at exactly `dir`.
    pub fn rename_for(&self, dir: &Path) -> Option<&str> {
        self.get(dir).and_then(|o| o.rename.as_deref())
    }

    /// Document title: the root directory's rename override.
    pub fn document_title(&self) -> Option<&str> {
        self.rename_for(&self.root)
    }

    /// Author override from the root directory.
    pub fn author(&self) -> Option<&str> {
        self.get(&self.root).and_then(|o| o.author.as_deref())
    }

    /// DPI override from the root directory.
    pub fn dpi(&self) -> Option<u32> {
        self.get(&self.root).and_then(|o| o.dpi)
    }

    pub fn is_empty(&self) -> bool {
        self.by_dir.is_empty()
    }

    /// Re-key every directory through a relocation mapping.
    ///
    /// Used when content was copied elsewhere (for instance by an image
    /// purification step) so lookups by the new paths keep working. A
    /// directory is rebased onto the longest mapped ancestor, itself
    /// included; unmapped directories keep their key.
    pub fn relocate(&self, mapping: &BTreeMap<PathBuf, PathBuf>) -> Overrides {
        let by_dir = self
            .by_dir
            .iter()
            .map(|(dir, overrides)| (relocate_path(dir, mapping), overrides.clone()))
            .collect();
        Overrides {
            root: relocate_path(&self.root, mapping),
            by_dir,
        }
    }
}

/// Rebase `path` onto the longest mapped ancestor (itself included).
pub fn relocate_path(path: &Path, mapping: &BTreeMap<PathBuf, PathBuf>) -> PathBuf {
    mapping
        .iter()
        .filter_map(|(from, to)| {
            path.strip_prefix(from).ok().map(|rest| {
                let relocated = if rest.as_os_str().is_empty() {
                    to.clone()
                } else {
                    to.join(rest)
                };
                (from.components().count(), relocated)
            })
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, relocated)| relocated)
        .unwrap_or_else(|| path.to_path_buf())
}

/// Outcome of combining an explicit value with a file override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precedence<T> {
    pub value: Option<T>,
    /// True when both were present and the file value was discarded.
    pub shadowed: bool,
}

/// Explicit values always win over file overrides.
pub fn prefer_explicit<T>(explicit: Option<T>, from_file: Option<T>) -> Precedence<T> {
    let shadowed = explicit.is_some() && from_file.is_some();
    Precedence {
        value: explicit.or(from_file),
        shadowed,
    }
}
