//! Shared test utilities for the bookdir test suite.
//!
//! Builds throwaway input trees from a compact path list and extracts the
//! fields tests usually compare.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = build_tree(&["A/img1.jpg", "B/", "C/img2.jpg"]);
//! let doc = compile(tmp.path(), &CompileOptions::default()).unwrap();
//!
//! assert_eq!(bookmark_titles(&doc), vec!["A", "B", "C"]);
//! assert_eq!(bookmark_targets(&doc), vec![0, 1, 1]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::document::CompiledDocument;
use crate::scan::ScanOutput;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given relative paths.
///
/// A trailing `/` creates an empty directory; anything else is a file with
/// placeholder content. Parent directories are created as needed.
pub fn build_tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for path in paths {
        match path.strip_suffix('/') {
            Some(dir) => fs::create_dir_all(tmp.path().join(dir)).unwrap(),
            None => write_file(tmp.path(), path, "fake image"),
        }
    }
    tmp
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// File names of all units in scan order.
pub fn unit_names(scan: &ScanOutput) -> Vec<String> {
    scan.units
        .iter()
        .map(|u| {
            u.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// All bookmark titles in emission order.
pub fn bookmark_titles(doc: &CompiledDocument) -> Vec<&str> {
    doc.bookmarks.iter().map(|b| b.title.as_str()).collect()
}

/// All bookmark target pages in emission order.
pub fn bookmark_targets(doc: &CompiledDocument) -> Vec<usize> {
    doc.bookmarks.iter().map(|b| b.target_page).collect()
}
