//! Bookmark emission.
//!
//! Walks the [`ResolvedTree`] in the same pre-order used for page resolution
//! and emits one [`BookmarkRecord`] per directory node. Pages are never
//! bookmarked and neither is the root.
//!
//! Parents are referenced by their position in the emitted list, and a parent
//! is always emitted before its children, so an encoder that needs parents
//! declared first can consume the list front to back.

use crate::metadata::Overrides;
use crate::naming;
use crate::resolve::{ResolvedDirectory, ResolvedNode, ResolvedTree};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkRecord {
    pub title: String,
    pub target_page: usize,
    /// Index of the parent record in the emitted list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub depth: usize,
    /// Directory the bookmark was derived from.
    pub source: PathBuf,
}

/// Title rules applied to every bookmark.
#[derive(Debug, Clone, Copy)]
pub struct TitleRules<'a> {
    pub overrides: &'a Overrides,
    pub separator: Option<&'a str>,
}

impl TitleRules<'_> {
    fn title_for(&self, dir: &ResolvedDirectory) -> String {
        naming::resolve_title(
            &dir.name,
            self.overrides.rename_for(&dir.path),
            self.separator,
        )
    }
}

struct Emitter<'a> {
    rules: TitleRules<'a>,
    records: Vec<BookmarkRecord>,
    open: Vec<usize>,
}

impl Emitter<'_> {
    fn visit(&mut self, nodes: &[ResolvedNode]) {
        for node in nodes {
            let ResolvedNode::Directory(dir) = node else {
                continue;
            };
            let index = self.records.len();
            self.records.push(BookmarkRecord {
                title: self.rules.title_for(dir),
                target_page: dir.target_page,
                parent: self.open.last().copied(),
                depth: self.open.len(),
                source: dir.path.clone(),
            });
            if !dir.children.is_empty() {
                self.open.push(index);
                self.visit(&dir.children);
                self.open.pop();
            }
        }
    }
}

/// Emit the bookmark list for a resolved tree.
pub fn emit(tree: &ResolvedTree, rules: TitleRules<'_>) -> Vec<BookmarkRecord> {
    let mut emitter = Emitter {
        rules,
        records: Vec::new(),
        open: Vec::new(),
    };
    emitter.visit(&tree.nodes);
    emitter.records
}
