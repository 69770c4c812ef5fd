//! Finding the line block that encloses a node.
//!
//! The walk is written against [`NodeTree`] so it can run over any tree with
//! parent links, not just [`Document`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::document::{Document, ElementKind, NodeId, TreeError};

/// Block kinds that count as a "line" for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineKind {
    Paragraph,
    ListItem,
    /// Heading level 1-3
    Heading(u8),
    Container,
}

impl LineKind {
    /// Map an element onto the line allow-list.
    pub const fn from_element(kind: &ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Paragraph => Some(Self::Paragraph),
            ElementKind::ListItem => Some(Self::ListItem),
            ElementKind::Heading(level @ 1..=3) => Some(Self::Heading(*level)),
            ElementKind::Container | ElementKind::HtmlBlock | ElementKind::TableRow { .. } => {
                Some(Self::Container)
            }
            _ => None,
        }
    }
}

/// A tree of nodes with parent links.
pub trait NodeTree {
    type Id: Copy + Eq + fmt::Debug;

    /// Parent of `id`, or `None` for the root and detached nodes.
    fn parent(&self, id: Self::Id) -> Option<Self::Id>;

    /// Line kind of `id`, if it is on the allow-list.
    fn line_kind(&self, id: Self::Id) -> Option<LineKind>;

    /// Upper bound on the length of any parent chain.
    fn node_count(&self) -> usize;
}

/// Why a walk failed to reach either a line block or the root.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WalkError<Id: fmt::Debug> {
    #[error("node {0:?} has no parent before reaching the root")]
    Detached(Id),
    #[error("walk from {0:?} did not terminate within {1} steps")]
    Cycle(Id, usize),
}

impl From<WalkError<NodeId>> for TreeError {
    fn from(err: WalkError<NodeId>) -> Self {
        match err {
            WalkError::Detached(id) => Self::Detached(id),
            WalkError::Cycle(id, steps) => Self::Cycle(id, steps),
        }
    }
}

/// Walk upward from `start` to the nearest line block.
///
/// Returns `Ok(None)` when the walk reaches `root` first: the root itself is
/// never a line. The walk takes at most `node_count()` steps.
///
/// # Errors
/// [`WalkError::Detached`] when the chain ends without reaching `root`,
/// [`WalkError::Cycle`] when it runs past the step bound.
pub fn enclosing_block<T: NodeTree>(
    tree: &T,
    root: T::Id,
    start: T::Id,
) -> Result<Option<(T::Id, LineKind)>, WalkError<T::Id>> {
    let bound = tree.node_count();
    let mut current = start;
    for _ in 0..=bound {
        if current == root {
            return Ok(None);
        }
        if let Some(kind) = tree.line_kind(current) {
            return Ok(Some((current, kind)));
        }
        current = tree.parent(current).ok_or(WalkError::Detached(current))?;
    }
    Err(WalkError::Cycle(start, bound))
}

impl NodeTree for Document {
    type Id = NodeId;

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent()
    }

    fn line_kind(&self, id: NodeId) -> Option<LineKind> {
        self.get(id)?.element().and_then(LineKind::from_element)
    }

    fn node_count(&self) -> usize {
        Self::node_count(self)
    }
}
