//! Core document types.
//!
//! The document is an arena of nodes linked by parent/child indices.
//! Detaching a node only unlinks it; [`Document::reclaim_detached`] later
//! frees every slot that is no longer reachable from the root. Freed slots
//! are reused under a new generation, so a stale [`NodeId`] resolves to
//! [`TreeError::UnknownNode`] instead of to whatever took its place.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class carried by the element that contains the caret.
pub const CURRENT_POSITION_CLASS: &str = "current-position";

/// Slot index plus the generation the slot had when the node was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Raw arena index.
    pub const fn index(self) -> usize {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

/// Column alignment of a table, from its delimiter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlign {
    None,
    Left,
    Center,
    Right,
}

/// Element kinds the editing surface knows how to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    // Blocks
    Paragraph,
    /// Heading level 1-6
    Heading(u8),
    List { ordered: bool },
    ListItem,
    BlockQuote,
    CodeBlock { info: String },
    /// Generic block container (`div`)
    Container,
    /// Thematic break
    Rule,
    Table { alignments: Vec<ColumnAlign> },
    TableRow { header: bool },
    TableCell,
    /// Raw HTML block, kept verbatim
    HtmlBlock,

    // Inline
    Emphasis,
    Strong,
    Strikethrough,
    Code,
    Link { url: String, title: String },
    /// Image; holds no children, its alt text is not part of the visible text
    Image { url: String, title: String, alt: String },
    /// Raw inline HTML, kept verbatim
    InlineHtml,
    Span,
}

impl ElementKind {
    /// Whether this element starts a new line in the visible text.
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph
                | Self::Heading(_)
                | Self::List { .. }
                | Self::ListItem
                | Self::BlockQuote
                | Self::CodeBlock { .. }
                | Self::Container
                | Self::Rule
                | Self::Table { .. }
                | Self::TableRow { .. }
                | Self::TableCell
                | Self::HtmlBlock
        )
    }

    /// HTML tag name used when serialising.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(4) => "h4",
            Self::Heading(5) => "h5",
            Self::Heading(_) => "h6",
            Self::List { ordered: true } => "ol",
            Self::List { ordered: false } => "ul",
            Self::ListItem => "li",
            Self::BlockQuote => "blockquote",
            Self::CodeBlock { .. } => "pre",
            Self::Container | Self::HtmlBlock => "div",
            Self::Rule => "hr",
            Self::Table { .. } => "table",
            Self::TableRow { .. } => "tr",
            Self::TableCell => "td",
            Self::Emphasis => "em",
            Self::Strong => "strong",
            Self::Strikethrough => "del",
            Self::Code => "code",
            Self::Link { .. } => "a",
            Self::Image { .. } => "img",
            Self::InlineHtml | Self::Span => "span",
        }
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The editable root. Exactly one per document.
    Root,
    Element(ElementKind),
    Text(String),
    LineBreak,
}

/// A single node in the document arena.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    class: Option<String>,
    style: Option<String>,
}

impl Node {
    const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            class: None,
            style: None,
        }
    }

    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// The element kind, if this node is an element.
    pub const fn element(&self) -> Option<&ElementKind> {
        match &self.kind {
            NodeKind::Element(kind) => Some(kind),
            _ => None,
        }
    }

    /// The text of a text leaf.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub const fn is_block(&self) -> bool {
        match &self.kind {
            NodeKind::Element(kind) => kind.is_block(),
            _ => false,
        }
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_) | NodeKind::LineBreak)
    }

    /// Character length of a leaf. Elements report zero.
    pub fn leaf_len(&self) -> usize {
        match &self.kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::LineBreak => 1,
            _ => 0,
        }
    }

    pub fn has_marker(&self) -> bool {
        self.class.as_deref() == Some(CURRENT_POSITION_CLASS)
    }
}

/// Caret position, mirroring the start of a selection range.
///
/// For a text leaf `offset` counts characters into its text. For an element
/// (or the root) it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

impl Caret {
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Failures raised by tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is detached from the document")]
    Detached(NodeId),
    #[error("parent chain from node {0} does not terminate within {1} steps")]
    Cycle(NodeId, usize),
    #[error("offset {offset} is outside node {node} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },
    #[error("node {node} is not inside {ancestor}")]
    NotDescendant { node: NodeId, ancestor: NodeId },
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The document buffer: an arena tree rooted at the editable surface.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    /// Create a document holding only the editable root.
    pub fn empty() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new(NodeKind::Root)),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Look up a node, failing for ids that never belonged to this arena.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownNode`] for out-of-range ids.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Allocate a new detached node, reusing a freed slot when there is one.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(Node::new(kind));
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node::new(kind)),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Free every node that is not reachable from the root.
    ///
    /// Ids of freed nodes stop resolving. Returns how many were freed.
    pub fn reclaim_detached(&mut self) -> usize {
        let mut reachable = vec![false; self.slots.len()];
        for id in self.descendants(self.root) {
            reachable[id.index] = true;
        }
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if reachable[index] || slot.node.is_none() {
                continue;
            }
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
            freed += 1;
        }
        freed
    }

    pub fn create_element(&mut self, kind: ElementKind) -> NodeId {
        self.create(NodeKind::Element(kind))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// # Errors
    /// Fails when either node is unknown or `parent` is a leaf.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it first.
    ///
    /// # Errors
    /// Fails when either node is unknown, `parent` is a leaf, or `index`
    /// is past the end of the child list.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        if self.node(parent)?.is_leaf() {
            return Err(TreeError::NotAContainer(parent));
        }
        self.node(child)?;
        self.detach(child)?;
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(TreeError::OffsetOutOfRange {
                node: parent,
                offset: index,
                len,
            });
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent. Detaching a detached node is a no-op.
    ///
    /// # Errors
    /// Fails for unknown ids.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.get(parent)?.children.iter().position(|&c| c == id)
    }

    /// Whether the parent chain of `id` reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        for _ in 0..=self.slots.len() {
            if current == self.root {
                return true;
            }
            match self.get(current).and_then(Node::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// All nodes below `id` in document order, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.get(next) else { continue };
            out.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Nearest ancestor-or-self that is a block element, or the root.
    ///
    /// # Errors
    /// Fails when the chain leaves the document before reaching a block.
    pub fn block_of(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut current = id;
        for _ in 0..=self.slots.len() {
            let node = self.node(current)?;
            if current == self.root || node.is_block() {
                return Ok(current);
            }
            current = node.parent.ok_or(TreeError::Detached(current))?;
        }
        Err(TreeError::Cycle(id, self.slots.len()))
    }

    pub fn set_class(&mut self, id: NodeId, class: Option<&str>) -> Result<(), TreeError> {
        self.node_mut(id)?.class = class.map(ToOwned::to_owned);
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: Option<&str>) -> Result<(), TreeError> {
        self.node_mut(id)?.style = style.map(ToOwned::to_owned);
        Ok(())
    }

    /// Replace the kind of an element in place, keeping its children.
    pub(crate) fn set_element_kind(
        &mut self,
        id: NodeId,
        kind: ElementKind,
    ) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        match node.kind {
            NodeKind::Element(_) => {
                node.kind = NodeKind::Element(kind);
                Ok(())
            }
            _ => Err(TreeError::NotAContainer(id)),
        }
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Result<&mut String, TreeError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(text) => Ok(text),
            _ => Err(TreeError::OffsetOutOfRange {
                node: id,
                offset: 0,
                len: 0,
            }),
        }
    }

    /// Attached elements currently carrying the current-position class.
    pub fn marked_elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(Node::has_marker))
            .collect()
    }

    /// Concatenated text of the leaves below `id`.
    ///
    /// Meant for inline content: nested blocks are not separated.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.get(node).map(Node::kind) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::LineBreak) => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// Blocks that hold text directly, in document order, with their text.
    ///
    /// These are the visible lines of the surface. Rules contribute no line.
    pub fn lines(&self) -> Vec<(NodeId, String)> {
        let mut out = Vec::new();
        self.collect_lines(self.root, &mut out);
        out
    }

    fn collect_lines(&self, id: NodeId, out: &mut Vec<(NodeId, String)>) {
        let Some(node) = self.get(id) else { return };
        if matches!(node.element(), Some(ElementKind::Rule)) {
            return;
        }
        let has_block_children = node
            .children
            .iter()
            .any(|&c| self.get(c).is_some_and(Node::is_block));
        if has_block_children || id == self.root {
            // Loose inline runs next to blocks form their own line.
            let mut inline_run = String::new();
            let mut in_run = false;
            for &child in &node.children {
                let Some(child_node) = self.get(child) else { continue };
                if child_node.is_block() {
                    if in_run {
                        out.push((id, std::mem::take(&mut inline_run)));
                        in_run = false;
                    }
                    self.collect_lines(child, out);
                } else {
                    inline_run.push_str(&self.text_content(child));
                    in_run = true;
                }
            }
            if in_run {
                out.push((id, inline_run));
            }
        } else {
            out.push((id, self.text_content(id)));
        }
    }

    /// The visible text of the whole surface: one line per text block.
    pub fn visible_text(&self) -> String {
        self.lines()
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Character count of [`Document::visible_text`].
    pub fn char_count(&self) -> usize {
        let lines = self.lines();
        let chars: usize = lines.iter().map(|(_, text)| text.chars().count()).sum();
        chars + lines.len().saturating_sub(1)
    }

    /// Character offset of `caret` measured from the start of `ancestor`'s text.
    ///
    /// # Errors
    /// Fails when the caret node is unknown, not below `ancestor`, or the
    /// offset overruns the node.
    pub fn caret_offset_in(&self, ancestor: NodeId, caret: Caret) -> Result<usize, TreeError> {
        let node = self.node(caret.node)?;
        let mut before = 0;
        let within = match node.kind() {
            NodeKind::Text(_) | NodeKind::LineBreak => {
                let len = node.leaf_len();
                if caret.offset > len {
                    return Err(TreeError::OffsetOutOfRange {
                        node: caret.node,
                        offset: caret.offset,
                        len,
                    });
                }
                if !self.chars_before(ancestor, caret.node, &mut before) {
                    return Err(TreeError::NotDescendant {
                        node: caret.node,
                        ancestor,
                    });
                }
                caret.offset
            }
            NodeKind::Element(_) | NodeKind::Root => {
                let len = node.children.len();
                if caret.offset > len {
                    return Err(TreeError::OffsetOutOfRange {
                        node: caret.node,
                        offset: caret.offset,
                        len,
                    });
                }
                if !self.chars_before(ancestor, caret.node, &mut before) {
                    return Err(TreeError::NotDescendant {
                        node: caret.node,
                        ancestor,
                    });
                }
                node.children[..caret.offset]
                    .iter()
                    .map(|&c| self.text_content(c).chars().count())
                    .sum()
            }
        };
        Ok(before + within)
    }

    // Adds the characters preceding `target` inside `within` to `acc`.
    // Returns whether `target` was found.
    fn chars_before(&self, within: NodeId, target: NodeId, acc: &mut usize) -> bool {
        if within == target {
            return true;
        }
        let Some(node) = self.get(within) else {
            return false;
        };
        if node.is_leaf() {
            *acc += node.leaf_len();
            return false;
        }
        node.children
            .iter()
            .any(|&child| self.chars_before(child, target, acc))
    }

    /// Resolve a character offset inside `block` to a caret on a text leaf.
    ///
    /// An offset on a leaf boundary resolves to the end of the earlier leaf.
    /// Offsets past the end clamp to the last text leaf. A block without
    /// text resolves to a caret on the block itself.
    pub fn caret_in(&self, block: NodeId, offset: usize) -> Caret {
        let mut acc = 0;
        let mut last_text = None;
        for id in self.descendants(block) {
            let Some(node) = self.get(id) else { continue };
            match node.kind() {
                NodeKind::Text(text) => {
                    let len = text.chars().count();
                    if offset <= acc + len {
                        return Caret::new(id, offset.saturating_sub(acc));
                    }
                    acc += len;
                    last_text = Some((id, len));
                }
                NodeKind::LineBreak => acc += 1,
                _ => {}
            }
        }
        match last_text {
            Some((id, len)) => Caret::new(id, len),
            None => Caret::new(block, 0),
        }
    }

    /// Caret at a character offset of a visible line.
    pub fn caret_at_line(&self, line: usize, offset: usize) -> Option<Caret> {
        let (block, _) = self.lines().into_iter().nth(line)?;
        Some(self.caret_in(block, offset))
    }

    /// Caret at the end of the first visible line.
    pub fn start_caret(&self) -> Caret {
        self.lines().first().map_or_else(
            || Caret::new(self.root, 0),
            |(block, text)| self.caret_in(*block, text.chars().count()),
        )
    }

    /// Caret at the end of the last visible line.
    pub fn end_caret(&self) -> Caret {
        self.lines().last().map_or_else(
            || Caret::new(self.root, self.get(self.root).map_or(0, |root| root.children.len())),
            |(block, text)| self.caret_in(*block, text.chars().count()),
        )
    }

    /// Merge adjacent text leaves among `parent`'s children.
    pub(crate) fn normalize(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let children = self.node(parent)?.children.clone();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            let text = self.node(child)?.text().map(ToOwned::to_owned);
            match (previous_text, text) {
                (Some(prev), Some(text)) => {
                    self.text_mut(prev)?.push_str(&text);
                    self.detach(child)?;
                }
                (None, Some(_)) => previous_text = Some(child),
                (_, None) => previous_text = None,
            }
        }
        Ok(())
    }

    /// Split a text leaf at a character offset; returns the new right half.
    ///
    /// Splitting at either end is a no-op that returns `None`.
    pub(crate) fn split_text(
        &mut self,
        id: NodeId,
        offset: usize,
    ) -> Result<Option<NodeId>, TreeError> {
        let len = self.node(id)?.leaf_len();
        if offset == 0 || offset >= len {
            return Ok(None);
        }
        let parent = self.node(id)?.parent.ok_or(TreeError::Detached(id))?;
        let text = self.text_mut(id)?;
        let byte = byte_index(text, offset);
        let right = text.split_off(byte);
        let right_id = self.create_text(right);
        let index = self.index_in_parent(id).ok_or(TreeError::Detached(id))?;
        self.insert_child(parent, index + 1, right_id)?;
        Ok(Some(right_id))
    }
}

/// Byte index of the `chars`-th character of `text`, clamped to its length.
pub(crate) fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph_doc(parts: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::empty();
        let p = doc.create_element(ElementKind::Paragraph);
        doc.append_child(doc.root(), p).unwrap();
        let leaves = parts
            .iter()
            .map(|part| {
                let t = doc.create_text(*part);
                doc.append_child(p, t).unwrap();
                t
            })
            .collect();
        (doc, p, leaves)
    }

    #[test]
    fn test_empty_document_has_no_lines() {
        let doc = Document::empty();
        assert!(doc.lines().is_empty());
        assert_eq!(doc.visible_text(), "");
        assert_eq!(doc.char_count(), 0);
    }

    #[test]
    fn test_visible_text_joins_blocks_with_newlines() {
        let mut doc = Document::empty();
        for text in ["one", "two"] {
            let p = doc.create_element(ElementKind::Paragraph);
            let t = doc.create_text(text);
            doc.append_child(p, t).unwrap();
            doc.append_child(doc.root(), p).unwrap();
        }
        assert_eq!(doc.visible_text(), "one\ntwo");
        assert_eq!(doc.char_count(), 7);
    }

    #[test]
    fn test_detach_unlinks_from_parent() {
        let (mut doc, p, leaves) = paragraph_doc(&["a", "b"]);
        doc.detach(leaves[0]).unwrap();
        assert_eq!(doc.node(p).unwrap().children(), &[leaves[1]]);
        assert!(!doc.is_attached(leaves[0]));
        assert!(doc.is_attached(leaves[1]));
    }

    #[test]
    fn test_insert_child_rejects_leaf_parent() {
        let (mut doc, _, leaves) = paragraph_doc(&["a"]);
        let t = doc.create_text("b");
        assert_eq!(
            doc.insert_child(leaves[0], 0, t),
            Err(TreeError::NotAContainer(leaves[0]))
        );
    }

    #[test]
    fn test_caret_offset_counts_preceding_leaves() {
        let (doc, p, leaves) = paragraph_doc(&["Hello ", "world"]);
        let offset = doc.caret_offset_in(p, Caret::new(leaves[1], 3)).unwrap();
        assert_eq!(offset, 9);
    }

    #[test]
    fn test_caret_offset_on_element_uses_child_index() {
        let (doc, p, _) = paragraph_doc(&["ab", "cd"]);
        assert_eq!(doc.caret_offset_in(p, Caret::new(p, 1)).unwrap(), 2);
        assert_eq!(doc.caret_offset_in(p, Caret::new(p, 2)).unwrap(), 4);
    }

    #[test]
    fn test_caret_offset_rejects_overrun() {
        let (doc, p, leaves) = paragraph_doc(&["ab"]);
        assert!(matches!(
            doc.caret_offset_in(p, Caret::new(leaves[0], 5)),
            Err(TreeError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_caret_in_prefers_earlier_leaf_on_boundary() {
        let (doc, p, leaves) = paragraph_doc(&["ab", "cd"]);
        assert_eq!(doc.caret_in(p, 2), Caret::new(leaves[0], 2));
        assert_eq!(doc.caret_in(p, 3), Caret::new(leaves[1], 1));
        assert_eq!(doc.caret_in(p, 99), Caret::new(leaves[1], 2));
    }

    #[test]
    fn test_split_text_and_normalize_roundtrip() {
        let (mut doc, p, leaves) = paragraph_doc(&["héllo"]);
        let right = doc.split_text(leaves[0], 2).unwrap().unwrap();
        assert_eq!(doc.node(leaves[0]).unwrap().text(), Some("hé"));
        assert_eq!(doc.node(right).unwrap().text(), Some("llo"));
        doc.normalize(p).unwrap();
        assert_eq!(doc.node(p).unwrap().children(), &[leaves[0]]);
        assert_eq!(doc.text_content(p), "héllo");
    }

    #[test]
    fn test_split_text_at_edges_is_noop() {
        let (mut doc, _, leaves) = paragraph_doc(&["abc"]);
        assert_eq!(doc.split_text(leaves[0], 0).unwrap(), None);
        assert_eq!(doc.split_text(leaves[0], 3).unwrap(), None);
    }

    #[test]
    fn test_reclaim_frees_detached_subtrees() {
        let (mut doc, p, leaves) = paragraph_doc(&["a", "b"]);
        let em = doc.create_element(ElementKind::Emphasis);
        let inner = doc.create_text("c");
        doc.append_child(em, inner).unwrap();
        doc.detach(leaves[0]).unwrap();
        assert_eq!(doc.node_count(), 6);

        assert_eq!(doc.reclaim_detached(), 3);
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.node(leaves[0]).err(), Some(TreeError::UnknownNode(leaves[0])));
        assert_eq!(doc.node(em).err(), Some(TreeError::UnknownNode(em)));
        assert_eq!(doc.text_content(p), "b");
    }

    #[test]
    fn test_reused_slot_does_not_answer_to_stale_id() {
        let (mut doc, _, leaves) = paragraph_doc(&["a", "b"]);
        doc.detach(leaves[0]).unwrap();
        doc.reclaim_detached();
        let fresh = doc.create_text("new");
        assert_eq!(fresh.index(), leaves[0].index());
        assert_ne!(fresh, leaves[0]);
        assert!(doc.get(leaves[0]).is_none());
        assert_eq!(doc.node(fresh).unwrap().text(), Some("new"));
    }

    #[test]
    fn test_block_of_finds_nearest_block() {
        let mut doc = Document::empty();
        let p = doc.create_element(ElementKind::Paragraph);
        let em = doc.create_element(ElementKind::Emphasis);
        let t = doc.create_text("x");
        doc.append_child(doc.root(), p).unwrap();
        doc.append_child(p, em).unwrap();
        doc.append_child(em, t).unwrap();
        assert_eq!(doc.block_of(t).unwrap(), p);
        assert_eq!(doc.block_of(doc.root()).unwrap(), doc.root());
    }
}
