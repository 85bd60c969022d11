//! Filesystem scanning and entry classification.
//!
//! Stage 1 of the compiler. Walks the input tree exactly once, in pre-order
//! with every level sorted by file name, and classifies each entry:
//!
//! ```text
//! book/
//! ├── book.title                   # Override (document title)
//! ├── 01. Cover/                   # Structural directory
//! │   └── cover.jpg                # Page 0
//! ├── 02. Chapter One/             # Structural directory
//! │   ├── chapter.title            # Override (bookmark rename)
//! │   ├── 001.png                  # Page 1
//! │   ├── 002.png                  # Page 2
//! │   └── Thumbs.db                # Ignored (silently)
//! ├── 03. Lost Chapter/            # Empty placeholder (no pages, no subdirs)
//! │   └── notes.txt                # Ignored (unsupported, warned)
//! └── 04. Appendix/
//!     └── 001.jpg                  # Page 3
//! ```
//!
//! ## Classification
//!
//! Files are classified by extension, first match wins:
//!
//! 1. ignored set (`.ignore`, `.db`) → skipped, logged
//! 2. override set (`.title`, `.author`, `.dpi`) → parsed into an [`Override`]
//! 3. page set (image formats) → page
//! 4. anything else → skipped with an unsupported-extension warning
//!
//! A directory is inspected one level down. Without any subdirectory or page
//! file it is an empty placeholder and becomes a unit of its own; otherwise
//! it is structural and only its contents become units.
//!
//! ## Output
//!
//! A [`ScanOutput`] holding every classified entry, the ordered unit stream
//! (pages and empty placeholders) consumed by [`crate::tree`], the collected
//! [`Overrides`], and any non-fatal warnings. Later stages never touch the
//! filesystem again, so the document is built from one consistent snapshot.

use crate::config::{self, BookConfig, CONFIG_FILE};
use crate::metadata::{self, Override, OverrideKind, Overrides};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Multiple {kind} overrides in directory: {}", dir.display())]
    MultipleOverrides { dir: PathBuf, kind: OverrideKind },
    #[error("Invalid override file {}: {reason}", path.display())]
    InvalidOverride { path: PathBuf, reason: String },
}

/// Non-fatal findings. They are logged as they happen and kept in the
/// output so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanWarning {
    UnsupportedExtension { path: PathBuf },
    PathLength { path: PathBuf, len: usize },
    MisplacedOverride { path: PathBuf, kind: OverrideKind },
    EmptyDocument,
    OverrideShadowed { kind: OverrideKind },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::UnsupportedExtension { path } => {
                write!(f, "Unsupported file, ignoring: {}", path.display())
            }
            ScanWarning::PathLength { path, len } => {
                write!(f, "Path is {len} bytes long: {}", path.display())
            }
            ScanWarning::MisplacedOverride { path, kind } => write!(
                f,
                "{kind} override only applies in the root directory, ignoring: {}",
                path.display()
            ),
            ScanWarning::EmptyDocument => write!(f, "No pages found"),
            ScanWarning::OverrideShadowed { kind } => {
                write!(f, "Explicit {kind} value overrides the {kind} file")
            }
        }
    }
}

/// How a filesystem node was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Page,
    MetadataOverride(OverrideKind),
    Ignored,
    StructuralDir,
    EmptyPlaceholderDir,
}

/// One filesystem node found during the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Page,
    Placeholder,
}

/// A terminal element of the document: a page or an empty placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentUnit {
    /// Absolute path of the image or directory.
    pub path: PathBuf,
    /// Path segments relative to the scan root.
    pub segments: Vec<String>,
    pub kind: UnitKind,
}

/// Everything the scan found, in discovery order.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub root: PathBuf,
    pub entries: Vec<DirectoryEntry>,
    pub units: Vec<DocumentUnit>,
    pub overrides: Overrides,
    pub warnings: Vec<ScanWarning>,
    /// The directory that was walked. Unchanged by [`ScanOutput::relocate`].
    pub scanned_root: PathBuf,
    /// Mappings applied by [`ScanOutput::relocate`], oldest first.
    pub relocations: Vec<BTreeMap<PathBuf, PathBuf>>,
}

impl ScanOutput {
    pub fn page_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.kind == UnitKind::Page)
            .count()
    }

    /// Absolute paths of all pages in discovery order.
    pub fn page_paths(&self) -> impl Iterator<Item = &Path> {
        self.units
            .iter()
            .filter(|u| u.kind == UnitKind::Page)
            .map(|u| u.path.as_path())
    }

    /// Absolute path of the directory at `segments` below the root, in the
    /// same coordinates as the units (relocations applied).
    pub fn dir_path(&self, segments: &[String]) -> PathBuf {
        let scanned = segments
            .iter()
            .fold(self.scanned_root.clone(), |path, segment| path.join(segment));
        self.relocations
            .iter()
            .fold(scanned, |path, mapping| metadata::relocate_path(&path, mapping))
    }

    /// Re-point units, entries and overrides at relocated content.
    ///
    /// Relative segments are unchanged, so the document structure is the
    /// same; only absolute paths move.
    pub fn relocate(&self, mapping: &BTreeMap<PathBuf, PathBuf>) -> ScanOutput {
        let units = self
            .units
            .iter()
            .map(|u| DocumentUnit {
                path: metadata::relocate_path(&u.path, mapping),
                ..u.clone()
            })
            .collect();
        let entries = self
            .entries
            .iter()
            .map(|e| DirectoryEntry {
                path: metadata::relocate_path(&e.path, mapping),
                ..e.clone()
            })
            .collect();
        let mut relocations = self.relocations.clone();
        relocations.push(mapping.clone());
        ScanOutput {
            root: metadata::relocate_path(&self.root, mapping),
            entries,
            units,
            overrides: self.overrides.relocate(mapping),
            warnings: self.warnings.clone(),
            scanned_root: self.scanned_root.clone(),
            relocations,
        }
    }
}

/// Scan `root` and classify everything below it.
#[instrument(skip(config), fields(root = %root.display()))]
pub fn scan(root: &Path, config: &BookConfig) -> Result<ScanOutput, ScanError> {
    let root = std::path::absolute(root).map_err(|_| ScanError::NotADirectory(root.into()))?;
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let mut scanner = Scanner {
        root: &root,
        config,
        entries: Vec::new(),
        units: Vec::new(),
        overrides: Overrides::new(&root),
        warnings: Vec::new(),
    };

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e.file_name(), e.depth()));

    for entry in walker {
        let entry = entry?;
        scanner.check_path_length(entry.path());
        if entry.file_type().is_dir() {
            scanner.visit_dir(entry.path())?;
        } else if entry.path().is_file() {
            scanner.visit_file(entry.path())?;
        } else {
            debug!(path = %entry.path().display(), "Skipping symlink or special file");
        }
    }

    let Scanner {
        entries,
        units,
        overrides,
        mut warnings,
        ..
    } = scanner;

    let output_pages = units.iter().filter(|u| u.kind == UnitKind::Page).count();
    if output_pages == 0 {
        warn!("No pages found");
        warnings.push(ScanWarning::EmptyDocument);
    }
    info!(
        pages = output_pages,
        units = units.len(),
        warnings = warnings.len(),
        "Scan complete"
    );

    Ok(ScanOutput {
        scanned_root: root.clone(),
        root,
        entries,
        units,
        overrides,
        warnings,
        relocations: Vec::new(),
    })
}

/// Hidden entries are never part of a document, nor is the root config file.
fn is_skipped(name: &std::ffi::OsStr, depth: usize) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || (depth == 1 && name == CONFIG_FILE)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct Scanner<'a> {
    root: &'a Path,
    config: &'a BookConfig,
    entries: Vec<DirectoryEntry>,
    units: Vec<DocumentUnit>,
    overrides: Overrides,
    warnings: Vec<ScanWarning>,
}

impl Scanner<'_> {
    fn check_path_length(&mut self, path: &Path) {
        let len = path.as_os_str().len();
        if len >= self.config.path_length_warning {
            warn!(path = %path.display(), len, "Path length approaches filesystem limits");
            self.warnings.push(ScanWarning::PathLength {
                path: path.to_path_buf(),
                len,
            });
        }
    }

    fn push_entry(&mut self, path: &Path, kind: EntryKind) {
        self.entries.push(DirectoryEntry {
            path: path.to_path_buf(),
            name: name_of(path),
            kind,
        });
    }

    fn push_unit(&mut self, path: &Path, kind: UnitKind) {
        let segments = path
            .strip_prefix(self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        self.units.push(DocumentUnit {
            path: path.to_path_buf(),
            segments,
            kind,
        });
    }

    fn visit_dir(&mut self, path: &Path) -> Result<(), ScanError> {
        if self.has_content(path)? {
            debug!(path = %path.display(), "Structural directory");
            self.push_entry(path, EntryKind::StructuralDir);
        } else {
            info!(path = %path.display(), "Empty directory, adding placeholder bookmark");
            self.push_entry(path, EntryKind::EmptyPlaceholderDir);
            self.push_unit(path, UnitKind::Placeholder);
        }
        Ok(())
    }

    /// True if `dir` holds a subdirectory or a page file one level down.
    fn has_content(&self, dir: &Path) -> Result<bool, ScanError> {
        for child in fs::read_dir(dir)? {
            let child = child?;
            let name = child.file_name();
            if is_skipped(&name, usize::MAX) {
                continue;
            }
            if child.file_type()?.is_dir() {
                return Ok(true);
            }
            let path = child.path();
            let ext = extension_of(&path);
            if path.is_file()
                && !self.config.extensions.is_ignored(&ext)
                && self.config.overrides.kind_for(&ext).is_none()
                && self.config.extensions.is_page(&ext)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn visit_file(&mut self, path: &Path) -> Result<(), ScanError> {
        let ext = extension_of(path);

        if self.config.extensions.is_ignored(&ext) {
            info!(path = %path.display(), "Ignoring file");
            self.push_entry(path, EntryKind::Ignored);
        } else if let Some(kind) = self.config.overrides.kind_for(&ext) {
            self.record_override(path, kind)?;
            self.push_entry(path, EntryKind::MetadataOverride(kind));
        } else if self.config.extensions.is_page(&ext) {
            debug!(path = %path.display(), "Page");
            self.push_entry(path, EntryKind::Page);
            self.push_unit(path, UnitKind::Page);
        } else {
            warn!(path = %path.display(), "Unsupported file, ignoring");
            self.warnings.push(ScanWarning::UnsupportedExtension {
                path: path.to_path_buf(),
            });
            self.push_entry(path, EntryKind::Ignored);
        }
        Ok(())
    }

    fn record_override(&mut self, path: &Path, kind: OverrideKind) -> Result<(), ScanError> {
        let invalid = |reason: String| ScanError::InvalidOverride {
            path: path.to_path_buf(),
            reason,
        };
        let line = metadata::read_first_line(path)?
            .ok_or_else(|| invalid("override file has no content".to_string()))?;
        let value = Override::parse(kind, &line).map_err(invalid)?;

        let dir = path.parent().unwrap_or(self.root);
        if kind != OverrideKind::Rename && dir != self.root {
            warn!(path = %path.display(), %kind, "Override only applies in the root directory");
            self.warnings.push(ScanWarning::MisplacedOverride {
                path: path.to_path_buf(),
                kind,
            });
        }

        debug!(path = %path.display(), %kind, "Override");
        self.overrides
            .insert(dir, value)
            .map_err(|kind| ScanError::MultipleOverrides {
                dir: dir.to_path_buf(),
                kind,
            })
    }
}
