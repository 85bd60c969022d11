//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every line leads with what the reader cares about: the bookmark title and
//! where it points, or the page position and its source image. Filesystem
//! paths are shown relative to the input directory.
//!
//! # Output Format
//!
//! ## Table of contents
//!
//! ```text
//! My Book (4 pages)
//! 001 Chapter One → p. 2
//!     001 Section A → p. 2
//!     002 Section B → p. 3
//! 002 Lost Chapter → p. 4
//! ```
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 cover.jpg (1200×1600 px, 288.0×384.0 pt)
//! 002 01. Chapter One/001.png (1200×1600 px, 288.0×384.0 pt)
//!
//! Warnings
//!     Unsupported file, ignoring: /book/notes.txt
//!
//! Wrote 2 pages, 1 bookmark → book.json
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::document::{CompiledDocument, Manifest};
use crate::scan::ScanWarning;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Document header: title plus page count.
///
/// ```text
/// My Book (4 pages)
/// My Book by A. Writer (1 page)
/// ```
fn document_header(doc: &CompiledDocument) -> String {
    let pages = plural(doc.pages.len(), "page", "pages");
    match &doc.author {
        Some(author) => format!("{} by {} ({})", doc.title, author, pages),
        None => format!("{} ({})", doc.title, pages),
    }
}

/// Page line: position plus source path relative to the document root.
fn page_line(doc: &CompiledDocument, index: usize) -> String {
    let path = doc
        .relative_page(index)
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    format!("{} {}", format_index(index + 1), path)
}

// ============================================================================
// Table of contents
// ============================================================================

/// Format the bookmark outline, one line per bookmark.
///
/// Positions count siblings under the same parent; page numbers are 1-based
/// as a reader would see them.
pub fn format_toc(doc: &CompiledDocument) -> Vec<String> {
    let mut lines = vec![document_header(doc)];
    // Sibling counters: one per record (as a parent) plus one for top level.
    let mut child_counts = vec![0usize; doc.bookmarks.len()];
    let mut top_level = 0usize;

    for record in &doc.bookmarks {
        let counter = match record.parent {
            Some(parent) => &mut child_counts[parent],
            None => &mut top_level,
        };
        *counter += 1;
        lines.push(format!(
            "{}{} {} → p. {}",
            indent(record.depth),
            format_index(*counter),
            record.title,
            record.target_page + 1
        ));
    }

    if doc.bookmarks.is_empty() {
        lines.push("    (no bookmarks)".to_string());
    }
    lines
}

/// Print the table of contents to stdout.
pub fn print_toc(doc: &CompiledDocument) {
    for line in format_toc(doc) {
        println!("{}", line);
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Format non-fatal findings as an indented section. Empty when there are none.
pub fn format_warnings(warnings: &[ScanWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    lines.extend(warnings.iter().map(|w| format!("    {}", w)));
    lines
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the scan summary: every page with its size, then warnings.
pub fn format_scan_output(manifest: &Manifest<'_>, manifest_path: &Path) -> Vec<String> {
    let doc = manifest.document;
    let mut lines = vec![document_header(doc), String::new(), "Pages".to_string()];

    for (index, size) in manifest.page_sizes.iter().enumerate() {
        lines.push(format!(
            "{} ({}×{} px, {:.1}×{:.1} pt)",
            page_line(doc, index),
            size.width_px,
            size.height_px,
            size.width_pt,
            size.height_pt
        ));
    }

    let warnings = format_warnings(&doc.warnings);
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.extend(warnings);
    }

    lines.push(String::new());
    lines.push(format!(
        "Wrote {}, {} → {}",
        plural(doc.pages.len(), "page", "pages"),
        plural(doc.bookmarks.len(), "bookmark", "bookmarks"),
        manifest_path.display()
    ));
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest<'_>, manifest_path: &Path) {
    for line in format_scan_output(manifest, manifest_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the check summary: page list, bookmark count, warnings.
pub fn format_check_output(doc: &CompiledDocument) -> Vec<String> {
    let mut lines = vec![document_header(doc), String::new(), "Pages".to_string()];
    lines.extend((0..doc.pages.len()).map(|i| page_line(doc, i)));

    let warnings = format_warnings(&doc.warnings);
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.extend(warnings);
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(doc.pages.len(), "page", "pages"),
        plural(doc.bookmarks.len(), "bookmark", "bookmarks")
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(doc: &CompiledDocument) {
    for line in format_check_output(doc) {
        println!("{}", line);
    }
}
