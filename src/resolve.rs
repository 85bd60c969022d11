//! Page index resolution.
//!
//! A single depth-first pre-order walk over the [`DocumentTree`] with a
//! cursor pointing at the last page produced. Pages take the next index;
//! directories are pinned to the page their content will start on.
//!
//! ## Target policy
//!
//! Let `next` be the index the next page will receive.
//!
//! | Node | Target |
//! |------|--------|
//! | page | `next`, then the cursor advances |
//! | directory with pages below | `next` |
//! | fully empty directory with children | `next + 1`; the outermost one reserves |
//! | empty placeholder | `next`, or `next + 1` under a reserving ancestor |
//!
//! A fully empty directory that has children (only empty placeholders or
//! further empty directories below it) reserves one page of lookahead, so the
//! whole empty branch points one page past where its next non-empty sibling
//! starts. Reservations do not stack: directories nested inside a reserving
//! ancestor point at the same `next + 1` and never reserve again. The
//! reserving ancestor is handed down the recursion by value and never shared
//! with siblings.
//!
//! Every directory target is clamped to the last real page. A document with
//! no pages at all pins everything to page 0.

use crate::tree::{DirectoryNode, DocumentTree, TreeNode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered page image paths. Position in the sequence is the page number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSequence(Vec<PathBuf>);

impl PageSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.0.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedNode {
    Page { index: usize, path: PathBuf },
    Directory(ResolvedDirectory),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDirectory {
    pub name: String,
    pub path: PathBuf,
    pub target_page: usize,
    pub placeholder: bool,
    /// This directory is the outermost of a fully empty branch.
    pub reserves: bool,
    pub children: Vec<ResolvedNode>,
}

/// The tree with every page indexed and every directory targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTree {
    pub root: PathBuf,
    pub pages: PageSequence,
    pub nodes: Vec<ResolvedNode>,
}

/// Traversal state owned by a single resolution call.
struct Cursor {
    last_page: Option<usize>,
    total_pages: usize,
    pages: Vec<PathBuf>,
}

impl Cursor {
    fn next(&self) -> usize {
        self.last_page.map_or(0, |last| last + 1)
    }

    fn clamp(&self, target: usize) -> usize {
        target.min(self.total_pages.saturating_sub(1))
    }
}

/// Assign page indices and directory targets.
pub fn resolve(tree: &DocumentTree) -> ResolvedTree {
    let mut cursor = Cursor {
        last_page: None,
        total_pages: tree.page_count(),
        pages: Vec::with_capacity(tree.page_count()),
    };
    let nodes = resolve_children(&tree.root.children, None, &mut cursor);
    ResolvedTree {
        root: tree.root_path().to_path_buf(),
        pages: PageSequence(cursor.pages),
        nodes,
    }
}

fn resolve_children(
    children: &[TreeNode],
    reserved_by: Option<&Path>,
    cursor: &mut Cursor,
) -> Vec<ResolvedNode> {
    children
        .iter()
        .map(|child| resolve_node(child, reserved_by, cursor))
        .collect()
}

fn resolve_node(node: &TreeNode, reserved_by: Option<&Path>, cursor: &mut Cursor) -> ResolvedNode {
    match node {
        TreeNode::Page(page) => {
            let index = cursor.next();
            cursor.last_page = Some(index);
            cursor.pages.push(page.path.clone());
            ResolvedNode::Page {
                index,
                path: page.path.clone(),
            }
        }
        TreeNode::Directory(dir) => ResolvedNode::Directory(resolve_directory(dir, reserved_by, cursor)),
    }
}

fn resolve_directory(
    dir: &DirectoryNode,
    reserved_by: Option<&Path>,
    cursor: &mut Cursor,
) -> ResolvedDirectory {
    let next = cursor.next();

    let (target, reserves, child_reservation) = if dir.is_placeholder() {
        let target = if reserved_by.is_some() { next + 1 } else { next };
        (target, false, reserved_by)
    } else if dir.page_count > 0 {
        (next, false, reserved_by)
    } else {
        match reserved_by {
            Some(owner) => (next + 1, false, Some(owner)),
            None => (next + 1, true, Some(dir.path.as_path())),
        }
    };

    let target_page = cursor.clamp(target);
    debug!(
        path = %dir.path.display(),
        target,
        target_page,
        reserves,
        "Resolved directory target"
    );

    let children = resolve_children(&dir.children, child_reservation, cursor);
    ResolvedDirectory {
        name: dir.name.clone(),
        path: dir.path.clone(),
        target_page,
        placeholder: dir.is_placeholder(),
        reserves,
        children,
    }
}
