//! # bookdir
//!
//! Compiles a directory of page images into an ordered document: a flat page
//! sequence plus a nested bookmark outline. The filesystem is the data
//! source: files become pages, directories become bookmarks, and small text
//! files override titles, author and resolution.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Scan       book/     →  ScanOutput     (filesystem → classified units)
//! 2. Tree       units     →  DocumentTree   (ordered prefix tree)
//! 3. Resolve    tree      →  ResolvedTree   (page indices, bookmark targets)
//! 4. Bookmarks  resolved  →  BookmarkRecord (title, target, parent)
//! ```
//!
//! Only the scan touches the filesystem. Every later stage is a pure function
//! of the previous stage's output, so unit tests can exercise tree shapes
//! directly without building directories on disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the input directory and classifies every entry |
//! | [`tree`] | Stage 2: builds the ordered prefix tree from scanned units |
//! | [`resolve`] | Stage 3: assigns page indices and bookmark target pages |
//! | [`bookmarks`] | Stage 4: emits the flat bookmark list with parent links |
//! | [`document`] | Runs the pipeline and builds the encoder manifest |
//! | [`metadata`] | `.title` / `.author` / `.dpi` override files |
//! | [`naming`] | Order-prefix stripping for bookmark titles |
//! | [`config`] | `bookdir.toml` loading, validation and merging |
//! | [`imaging`] | Page dimension probing via the `image` crate |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Empty Directories Still Get Bookmarks
//!
//! A directory with nothing in it is kept as a placeholder bookmark. Scanned
//! books often have chapters that were never digitized; the outline should
//! still show them, pointing at the page where the chapter would have been.
//!
//! ## Byte Order, Not Natural Order
//!
//! Entries are ordered by the raw bytes of their names. Use zero-padded
//! prefixes (`01.`, `02.`) for explicit ordering and strip them from titles
//! with an order separator.

pub mod bookmarks;
pub mod config;
pub mod document;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod resolve;
pub mod scan;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
