//! End-to-end tests through the public compile API.
//!
//! Each test builds a real directory tree in a temp dir and checks the
//! compiled document as an encoder would consume it.

use bookdir::document::{CompileOptions, CompiledDocument, compile};
use bookdir::scan::{ScanError, ScanWarning};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for path in paths {
        match path.strip_suffix('/') {
            Some(dir) => fs::create_dir_all(tmp.path().join(dir)).unwrap(),
            None => write(tmp.path(), path, "fake image"),
        }
    }
    tmp
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn compile_default(root: &Path) -> CompiledDocument {
    compile(root, &CompileOptions::default()).unwrap()
}

fn with_separator(sep: &str) -> CompileOptions {
    CompileOptions {
        order_separator: Some(sep.to_string()),
        ..CompileOptions::default()
    }
}

fn outline(doc: &CompiledDocument) -> Vec<(&str, usize, Option<usize>)> {
    doc.bookmarks
        .iter()
        .map(|b| (b.title.as_str(), b.target_page, b.parent))
        .collect()
}

fn page_names(doc: &CompiledDocument) -> Vec<String> {
    (0..doc.pages.len())
        .map(|i| doc.relative_page(i).unwrap().display().to_string())
        .collect()
}

/// A realistic scanned book with every kind of entry.
fn scanned_book() -> TempDir {
    let tmp = tree(&[
        "00 cover.jpg",
        "01. Front Matter/01 title.png",
        "01. Front Matter/02 contents.png",
        "02. Part One/01. Chapter One/001.jpg",
        "02. Part One/01. Chapter One/002.jpg",
        "02. Part One/02. Chapter Two/",
        "02. Part One/03. Chapter Three/001.jpg",
        "03. Missing Part/01. Lost/",
        "03. Missing Part/02. Also Lost/",
        "04. Appendix/001.tif",
        "04. Appendix/Thumbs.db",
        "04. Appendix/scan-notes.txt",
    ]);
    write(tmp.path(), "book.title", "A Scanned Book");
    write(tmp.path(), "scanner.author", "Jo Archivist");
    write(tmp.path(), "scan.dpi", "300");
    write(tmp.path(), "02. Part One/name.title", "Part I: Beginnings");
    tmp
}

// =========================================================================
// Worked examples
// =========================================================================

#[test]
fn empty_middle_directory_points_at_next_page() {
    let tmp = tree(&["A/img1.jpg", "B/", "C/img2.jpg"]);
    let doc = compile_default(tmp.path());
    assert_eq!(doc.pages.len(), 2);
    assert_eq!(
        outline(&doc),
        vec![("A", 0, None), ("B", 1, None), ("C", 1, None)]
    );
}

#[test]
fn root_pages_only() {
    let tmp = tree(&["cover.jpg", "intro.jpg"]);
    let doc = compile_default(tmp.path());
    assert_eq!(page_names(&doc), vec!["cover.jpg", "intro.jpg"]);
    assert!(doc.bookmarks.is_empty());
}

#[test]
fn separator_strips_prefix_or_keeps_name() {
    let tmp = tree(&["02. Chapter Two/a.jpg", "ChapterOnlyName/b.jpg"]);
    let doc = compile(tmp.path(), &with_separator(".")).unwrap();
    let titles: Vec<&str> = doc.bookmarks.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Chapter Two", "ChapterOnlyName"]);
}

#[test]
fn full_book_outline() {
    let tmp = scanned_book();
    let doc = compile(tmp.path(), &with_separator(".")).unwrap();

    assert_eq!(doc.title, "A Scanned Book");
    assert_eq!(doc.author.as_deref(), Some("Jo Archivist"));
    assert_eq!(doc.dpi, Some(300));
    assert_eq!(
        page_names(&doc),
        vec![
            "00 cover.jpg",
            "01. Front Matter/01 title.png",
            "01. Front Matter/02 contents.png",
            "02. Part One/01. Chapter One/001.jpg",
            "02. Part One/01. Chapter One/002.jpg",
            "02. Part One/03. Chapter Three/001.jpg",
            "04. Appendix/001.tif",
        ]
    );
    assert_eq!(
        outline(&doc),
        vec![
            ("Front Matter", 1, None),
            ("Part I: Beginnings", 3, None),
            ("Chapter One", 3, Some(1)),
            ("Chapter Two", 5, Some(1)),
            ("Chapter Three", 5, Some(1)),
            // Would reserve page 7, clamped to the last page
            ("Missing Part", 6, None),
            ("Lost", 6, Some(5)),
            ("Also Lost", 6, Some(5)),
            ("Appendix", 6, None),
        ]
    );
    assert!(matches!(
        doc.warnings.as_slice(),
        [ScanWarning::UnsupportedExtension { .. }]
    ));
}

// =========================================================================
// Invariants
// =========================================================================

#[test]
fn page_indices_follow_discovery_order() {
    let tmp = scanned_book();
    let doc = compile_default(tmp.path());
    let pages = doc.pages.as_slice();
    let mut sorted = pages.to_vec();
    sorted.sort();
    // Byte order of full paths matches pre-order with sorted levels here
    assert_eq!(pages, sorted.as_slice());
    assert_eq!(pages.len(), 7);
}

#[test]
fn targets_within_page_range() {
    let tmp = scanned_book();
    let doc = compile_default(tmp.path());
    for bookmark in &doc.bookmarks {
        assert!(bookmark.target_page < doc.pages.len().max(1));
    }
}

#[test]
fn parents_precede_children() {
    let tmp = scanned_book();
    let doc = compile_default(tmp.path());
    for (i, bookmark) in doc.bookmarks.iter().enumerate() {
        if let Some(parent) = bookmark.parent {
            assert!(parent < i, "bookmark {i} has parent {parent}");
            assert_eq!(doc.bookmarks[parent].depth + 1, bookmark.depth);
        } else {
            assert_eq!(bookmark.depth, 0);
        }
    }
}

#[test]
fn compiling_twice_is_identical() {
    let tmp = scanned_book();
    let first = compile(tmp.path(), &with_separator(".")).unwrap();
    let second = compile(tmp.path(), &with_separator(".")).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn rename_wins_over_separator() {
    let tmp = tree(&["01. Intro/a.jpg"]);
    write(tmp.path(), "01. Intro/x.title", "01. Keep My Prefix");
    let doc = compile(tmp.path(), &with_separator(".")).unwrap();
    assert_eq!(doc.bookmarks[0].title, "01. Keep My Prefix");
}

// =========================================================================
// Edge cases
// =========================================================================

#[test]
fn all_empty_document() {
    let tmp = tree(&["A/", "B/C/"]);
    let doc = compile_default(tmp.path());
    assert!(doc.is_empty());
    assert_eq!(
        outline(&doc),
        vec![("A", 0, None), ("B", 0, None), ("C", 0, Some(1))]
    );
    assert!(doc.warnings.contains(&ScanWarning::EmptyDocument));
}

#[test]
fn duplicate_overrides_fail() {
    let tmp = tree(&["ch/a.jpg"]);
    write(tmp.path(), "ch/one.title", "One");
    write(tmp.path(), "ch/two.title", "Two");
    let result = compile(tmp.path(), &CompileOptions::default());
    assert!(matches!(result, Err(ScanError::MultipleOverrides { .. })));
}

#[test]
fn invalid_dpi_fails() {
    let tmp = tree(&["a.jpg"]);
    write(tmp.path(), "scan.dpi", "high");
    let result = compile(tmp.path(), &CompileOptions::default());
    assert!(matches!(result, Err(ScanError::InvalidOverride { .. })));
}

#[test]
fn invalid_config_fails() {
    let tmp = tree(&["a.jpg"]);
    write(tmp.path(), "bookdir.toml", "no_such_key = 1\n");
    let result = compile(tmp.path(), &CompileOptions::default());
    assert!(matches!(result, Err(ScanError::Config(_))));
}

#[test]
fn manifest_json_shape() {
    let tmp = tree(&["A/img1.jpg", "B/", "C/img2.jpg"]);
    let doc = compile_default(tmp.path());
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
    assert_eq!(json["bookmarks"][1]["title"], "B");
    assert_eq!(json["bookmarks"][1]["target_page"], 1);
    assert!(json["bookmarks"][0].get("parent").is_none());
    assert!(json.get("warnings").is_none());
}

#[test]
fn manifest_json_carries_warnings() {
    let tmp = tree(&["ch/a.jpg", "ch/notes.txt"]);
    write(tmp.path(), "ch/who.author", "Nested");
    let doc = compile_default(tmp.path());
    let json = serde_json::to_value(&doc).unwrap();
    let types: Vec<&str> = json["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["unsupported_extension", "misplaced_override"]);
    assert_eq!(json["warnings"][1]["kind"], "author");
}
