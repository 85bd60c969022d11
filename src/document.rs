//! The directory-to-document compiler.
//!
//! [`compile`] runs the whole pipeline over one input directory:
//!
//! ```text
//! scan  →  tree  →  resolve  →  bookmarks
//!   └── overrides (side lookup for titles, author, DPI)
//! ```
//!
//! Every stage consumes an immutable snapshot of the previous one, and the
//! filesystem is only read during the scan. The result is a
//! [`CompiledDocument`]: the ordered page sequence, the bookmark outline and
//! the document metadata, ready for an encoder.

use crate::bookmarks::{self, BookmarkRecord, TitleRules};
use crate::config::{self, BookConfig};
use crate::imaging::{self, ImageBackend, PageSize};
use crate::metadata::{self, OverrideKind};
use crate::resolve::{self, PageSequence};
use crate::scan::{self, ScanError, ScanWarning};
use crate::tree::{self, DocumentTree};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Caller-supplied values. Anything set here beats config and override files.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub order_separator: Option<String>,
    pub author: Option<String>,
    pub dpi: Option<u32>,
    /// Original → new path mapping when content was relocated after the scan.
    pub relocations: BTreeMap<PathBuf, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledDocument {
    pub root: PathBuf,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    pub pages: PageSequence,
    pub bookmarks: Vec<BookmarkRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScanWarning>,
    #[serde(skip)]
    pub tree: DocumentTree,
}

impl CompiledDocument {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn effective_dpi(&self) -> u32 {
        self.dpi.unwrap_or(imaging::DEFAULT_DPI)
    }

    /// Page path relative to the document root, for display.
    pub fn relative_page(&self, index: usize) -> Option<&Path> {
        self.pages
            .get(index)
            .map(|p| p.strip_prefix(&self.root).unwrap_or(p))
    }
}

/// Compile a directory, loading `bookdir.toml` from it if present.
pub fn compile(root: &Path, options: &CompileOptions) -> Result<CompiledDocument, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let config = config::load_config(root)?;
    compile_with_config(root, &config, options)
}

/// Compile a directory with an explicit config.
#[instrument(skip(config, options), fields(root = %root.display()))]
pub fn compile_with_config(
    root: &Path,
    config: &BookConfig,
    options: &CompileOptions,
) -> Result<CompiledDocument, ScanError> {
    let scanned = scan::scan(root, config)?;
    let scanned = if options.relocations.is_empty() {
        scanned
    } else {
        scanned.relocate(&options.relocations)
    };
    let overrides = &scanned.overrides;
    let mut warnings = scanned.warnings.clone();

    let author = metadata::prefer_explicit(options.author.clone(), overrides.author().map(String::from));
    if author.shadowed {
        warn!("Explicit author overrides the author file");
        warnings.push(ScanWarning::OverrideShadowed {
            kind: OverrideKind::Author,
        });
    }
    let dpi = metadata::prefer_explicit(options.dpi, overrides.dpi());
    if dpi.shadowed {
        warn!("Explicit DPI overrides the DPI file");
        warnings.push(ScanWarning::OverrideShadowed {
            kind: OverrideKind::Dpi,
        });
    }

    let separator = options
        .order_separator
        .as_deref()
        .or(config.order_separator.as_deref())
        .filter(|s| !s.is_empty());

    let tree = tree::build(&scanned);
    let resolved = resolve::resolve(&tree);
    let bookmarks = bookmarks::emit(
        &resolved,
        TitleRules {
            overrides,
            separator,
        },
    );

    let title = overrides
        .document_title()
        .map(String::from)
        .unwrap_or_else(|| {
            scanned
                .scanned_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    info!(
        pages = resolved.pages.len(),
        bookmarks = bookmarks.len(),
        "Compiled document"
    );

    Ok(CompiledDocument {
        root: scanned.root.clone(),
        title,
        author: author.value,
        dpi: dpi.value,
        pages: resolved.pages,
        bookmarks,
        warnings,
        tree,
    })
}

/// Everything an encoder needs: the compiled document plus page sizes.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    #[serde(flatten)]
    pub document: &'a CompiledDocument,
    pub page_sizes: Vec<PageSize>,
}

/// Probe page dimensions and assemble the encoder manifest.
pub fn build_manifest<'a>(
    document: &'a CompiledDocument,
    backend: &impl ImageBackend,
) -> Result<Manifest<'a>, imaging::BackendError> {
    let page_sizes = imaging::probe_pages(
        backend,
        document.pages.as_slice(),
        document.effective_dpi(),
    )?;
    Ok(Manifest {
        document,
        page_sizes,
    })
}
