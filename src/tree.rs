//! Ordered document tree built from the scan's unit stream.
//!
//! Each unit's root-relative path is split into segments and inserted into a
//! prefix tree, level by level. Children keep first-seen order, which is the
//! scan's alphabetical pre-order; nothing is re-sorted here.
//!
//! ```text
//! units                        tree
//! A/img1.png          →        A/
//! B            (placeholder)   │  └── img1.png
//! C/sub/img2.png               B/            (placeholder)
//!                              C/
//!                                 └── sub/
//!                                     └── img2.png
//! ```
//!
//! Because the unit stream is pre-order, the directory a unit belongs to is
//! always the most recently inserted sibling, so lookups scan from the back.

use crate::scan::{DocumentUnit, ScanOutput, UnitKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Page(PageLeaf),
    Directory(DirectoryNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Page(page) => &page.name,
            TreeNode::Directory(dir) => &dir.name,
        }
    }

    /// Pages at or below this node.
    pub fn page_count(&self) -> usize {
        match self {
            TreeNode::Page(_) => 1,
            TreeNode::Directory(dir) => dir.page_count,
        }
    }
}

/// A terminal page reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLeaf {
    pub name: String,
    pub path: PathBuf,
}

/// A directory node. Childless directory nodes are empty placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<TreeNode>,
    pub was_empty_placeholder: bool,
    /// Number of pages anywhere below this directory.
    pub page_count: usize,
}

impl DirectoryNode {
    fn new(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path,
            children: Vec::new(),
            was_empty_placeholder: false,
            page_count: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.children.is_empty()
    }

    /// Directory nodes at or below this one, excluding itself.
    pub fn directory_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                TreeNode::Page(_) => 0,
                TreeNode::Directory(dir) => 1 + dir.directory_count(),
            })
            .sum()
    }

    /// Insert `unit` below this node, which sits at `depth` segments.
    ///
    /// `dir_path` maps a segment prefix to the absolute path of a directory
    /// that was never a unit itself.
    fn insert<F>(&mut self, unit: &DocumentUnit, depth: usize, dir_path: &F)
    where
        F: Fn(&[String]) -> PathBuf,
    {
        let segments = &unit.segments;
        let Some(first) = segments.get(depth) else {
            return;
        };
        if unit.kind == UnitKind::Page {
            self.page_count += 1;
        }

        if depth + 1 == segments.len() {
            match unit.kind {
                UnitKind::Page => self.children.push(TreeNode::Page(PageLeaf {
                    name: first.clone(),
                    path: unit.path.clone(),
                })),
                UnitKind::Placeholder => {
                    let mut dir = DirectoryNode::new(first, unit.path.clone());
                    dir.was_empty_placeholder = true;
                    self.children.push(TreeNode::Directory(dir));
                }
            }
            return;
        }

        let existing = self.children.iter_mut().rev().find_map(|c| match c {
            TreeNode::Directory(dir) if dir.name == *first => Some(dir),
            _ => None,
        });
        if let Some(dir) = existing {
            dir.insert(unit, depth + 1, dir_path);
            return;
        }
        let mut dir = DirectoryNode::new(first, dir_path(&segments[..=depth]));
        dir.insert(unit, depth + 1, dir_path);
        self.children.push(TreeNode::Directory(dir));
    }
}

/// The whole document. The root itself is never bookmarked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTree {
    pub root: DirectoryNode,
}

impl DocumentTree {
    pub fn root_path(&self) -> &Path {
        &self.root.path
    }

    pub fn page_count(&self) -> usize {
        self.root.page_count
    }

    /// Number of directory nodes, i.e. the number of bookmarks to emit.
    pub fn directory_count(&self) -> usize {
        self.root.directory_count()
    }
}

/// Fold the ordered unit stream into a tree.
///
/// Directory paths follow the scan's relocations, so they match the override
/// keys and unit paths even when only part of the tree was moved.
pub fn build(scan: &ScanOutput) -> DocumentTree {
    build_with(&scan.root, &scan.units, |segments| scan.dir_path(segments))
}

/// Build a tree whose directories sit at `root` joined with their segments.
pub fn build_from_units(root: &Path, units: &[DocumentUnit]) -> DocumentTree {
    build_with(root, units, |segments| {
        segments
            .iter()
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    })
}

fn build_with<F>(root: &Path, units: &[DocumentUnit], dir_path: F) -> DocumentTree
where
    F: Fn(&[String]) -> PathBuf,
{
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tree_root = DirectoryNode::new(&name, root.to_path_buf());
    for unit in units {
        tree_root.insert(unit, 0, &dir_path);
    }
    DocumentTree { root: tree_root }
}
