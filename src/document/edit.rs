//! Text edits applied at a caret.
//!
//! Every edit returns the caret where typing continues.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::types::{Caret, Document, ElementKind, NodeId, NodeKind, TreeError, byte_index};

/// Formats the host can ask for (`format-to`).
///
/// Block formats act on the caret's block. Inline formats act on a
/// selected range of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockFormat {
    P,
    H1,
    H2,
    H3,
    /// Bulleted list
    Ul,
    Bold,
    Italic,
    /// Link whose target is the selected text
    Link,
}

impl BlockFormat {
    pub const fn is_inline(self) -> bool {
        matches!(self, Self::Bold | Self::Italic | Self::Link)
    }

    const fn heading_level(self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            _ => None,
        }
    }

    /// The inline element wrapping `selected` text.
    pub fn inline_element(self, selected: &str) -> Option<ElementKind> {
        match self {
            Self::Bold => Some(ElementKind::Strong),
            Self::Italic => Some(ElementKind::Emphasis),
            Self::Link => Some(ElementKind::Link {
                url: selected.trim().to_string(),
                title: String::new(),
            }),
            _ => None,
        }
    }
}

impl Document {
    /// Insert `text` at the caret.
    ///
    /// A caret on an element inserts a new text leaf at that child index;
    /// a caret on the root first creates a paragraph to hold it.
    ///
    /// # Errors
    /// Fails when the caret does not resolve inside the document.
    pub fn insert_text(&mut self, caret: Caret, text: &str) -> Result<Caret, TreeError> {
        let inserted = text.chars().count();
        match self.node(caret.node)?.kind().clone() {
            NodeKind::Text(current) => {
                let len = current.chars().count();
                if caret.offset > len {
                    return Err(TreeError::OffsetOutOfRange {
                        node: caret.node,
                        offset: caret.offset,
                        len,
                    });
                }
                let byte = byte_index(&current, caret.offset);
                self.text_mut(caret.node)?.insert_str(byte, text);
                Ok(Caret::new(caret.node, caret.offset + inserted))
            }
            NodeKind::LineBreak => {
                let parent = self
                    .node(caret.node)?
                    .parent()
                    .ok_or(TreeError::Detached(caret.node))?;
                let index = self
                    .index_in_parent(caret.node)
                    .ok_or(TreeError::Detached(caret.node))?;
                let leaf = self.create_text(text);
                self.insert_child(parent, index + caret.offset.min(1), leaf)?;
                Ok(Caret::new(leaf, inserted))
            }
            NodeKind::Root => {
                let paragraph = self.create_element(ElementKind::Paragraph);
                let leaf = self.create_text(text);
                self.append_child(paragraph, leaf)?;
                self.insert_child(caret.node, caret.offset, paragraph)?;
                Ok(Caret::new(leaf, inserted))
            }
            NodeKind::Element(_) => {
                let leaf = self.create_text(text);
                self.insert_child(caret.node, caret.offset, leaf)?;
                Ok(Caret::new(leaf, inserted))
            }
        }
    }

    /// Delete the character before the caret (Backspace).
    ///
    /// At the start of a block the block merges into the previous sibling
    /// block. At the very start of the document nothing happens.
    ///
    /// # Errors
    /// Fails when the caret does not resolve inside the document.
    pub fn delete_backward(&mut self, caret: Caret) -> Result<Caret, TreeError> {
        let block = self.block_of(caret.node)?;
        let offset = self.caret_offset_in(block, caret)?;
        if offset == 0 {
            return self.merge_with_previous(block, caret);
        }

        let (leaf, at) = self.leaf_after(block, offset - 1)?;
        match self.node(leaf)?.kind() {
            NodeKind::LineBreak => self.detach(leaf)?,
            _ => {
                let text = self.text_mut(leaf)?;
                let start = byte_index(text, at);
                let end = byte_index(text, at + 1);
                text.replace_range(start..end, "");
            }
        }
        let parent = self.node(leaf)?.parent();
        if self.node(leaf)?.text() == Some("") {
            self.detach(leaf)?;
        }
        if let Some(parent) = parent {
            self.normalize(parent)?;
        }
        Ok(self.caret_in(block, offset - 1))
    }

    // The leaf holding the character at `offset` (0-based) inside `block`,
    // with the offset local to that leaf.
    fn leaf_after(&self, block: NodeId, offset: usize) -> Result<(NodeId, usize), TreeError> {
        let mut acc = 0;
        for id in self.descendants(block) {
            let node = self.node(id)?;
            if !node.is_leaf() {
                continue;
            }
            let len = node.leaf_len();
            if offset < acc + len {
                return Ok((id, offset - acc));
            }
            acc += len;
        }
        Err(TreeError::OffsetOutOfRange {
            node: block,
            offset,
            len: acc,
        })
    }

    fn merge_with_previous(&mut self, block: NodeId, caret: Caret) -> Result<Caret, TreeError> {
        if block == self.root() {
            return Ok(caret);
        }
        let Some(index) = self.index_in_parent(block) else {
            return Err(TreeError::Detached(block));
        };
        if index == 0 {
            return Ok(caret);
        }
        let parent = self.node(block)?.parent().ok_or(TreeError::Detached(block))?;
        let previous = self.node(parent)?.children()[index - 1];
        let previous_node = self.node(previous)?;
        let mergeable = matches!(
            previous_node.element(),
            Some(ElementKind::Paragraph | ElementKind::Heading(_) | ElementKind::Container)
        ) && !previous_node
            .children()
            .iter()
            .any(|&c| self.get(c).is_some_and(|n| n.is_block()));
        if !mergeable {
            return Ok(caret);
        }
        let join = self.text_content(previous).chars().count();
        let moved = self.node(block)?.children().to_vec();
        for child in moved {
            self.append_child(previous, child)?;
        }
        self.detach(block)?;
        self.normalize(previous)?;
        Ok(self.caret_in(previous, join))
    }

    /// Split the caret's block in two (Enter).
    ///
    /// Headings continue as paragraphs; list items continue as list items.
    ///
    /// # Errors
    /// Fails when the caret does not resolve inside the document.
    pub fn split_block(&mut self, caret: Caret) -> Result<Caret, TreeError> {
        let block = self.block_of(caret.node)?;
        if block == self.root() {
            let paragraph = self.create_element(ElementKind::Paragraph);
            let index = self.node(block)?.children().len();
            self.insert_child(block, index, paragraph)?;
            return Ok(Caret::new(paragraph, 0));
        }
        let offset = self.caret_offset_in(block, caret)?;
        let kind = match self.node(block)?.element() {
            Some(ElementKind::Heading(_)) | None => ElementKind::Paragraph,
            Some(other) => other.clone(),
        };

        let cut = self.split_children_at(block, offset)?;
        let tail = self.node(block)?.children()[cut..].to_vec();

        let fresh = self.create_element(kind);
        let parent = self.node(block)?.parent().ok_or(TreeError::Detached(block))?;
        let index = self.index_in_parent(block).ok_or(TreeError::Detached(block))?;
        self.insert_child(parent, index + 1, fresh)?;
        for child in tail {
            self.append_child(fresh, child)?;
        }
        Ok(self.caret_in(fresh, 0))
    }

    // Split `parent`'s children so that `offset` falls between two of them,
    // returning the index of the first child after it. Inline elements that
    // straddle the offset are cloned and their right-hand children moved
    // into the clone.
    fn split_children_at(&mut self, parent: NodeId, offset: usize) -> Result<usize, TreeError> {
        let children = self.node(parent)?.children().to_vec();
        let mut acc = 0;
        for (index, child) in children.into_iter().enumerate() {
            if acc >= offset {
                return Ok(index);
            }
            let len = self.text_content(child).chars().count();
            if offset < acc + len {
                let within = offset - acc;
                match self.node(child)?.kind().clone() {
                    NodeKind::Text(_) => {
                        self.split_text(child, within)?;
                    }
                    NodeKind::Element(kind) => {
                        let cut = self.split_children_at(child, within)?;
                        let moved = self.node(child)?.children()[cut..].to_vec();
                        let clone = self.create_element(kind);
                        self.insert_child(parent, index + 1, clone)?;
                        for node in moved {
                            self.append_child(clone, node)?;
                        }
                    }
                    NodeKind::LineBreak | NodeKind::Root => {}
                }
                return Ok(index + 1);
            }
            acc += len;
        }
        Ok(self.node(parent)?.children().len())
    }

    /// Change the kind of the caret's block.
    ///
    /// Only paragraphs and headings change; other blocks are left alone, and
    /// a block that already is a level 1-3 heading refuses another heading.
    /// Returns the caret to continue from, or `None` when nothing changed.
    ///
    /// # Errors
    /// Fails when the caret does not resolve inside the document.
    pub fn set_block_format(
        &mut self,
        caret: Caret,
        format: BlockFormat,
    ) -> Result<Option<Caret>, TreeError> {
        let block = self.block_of(caret.node)?;
        let current = self.node(block)?.element().cloned();
        let convertible = matches!(
            current,
            Some(ElementKind::Paragraph | ElementKind::Heading(_))
        );
        if !convertible {
            return Ok(None);
        }
        match format {
            BlockFormat::P => {
                self.set_element_kind(block, ElementKind::Paragraph)?;
                Ok(Some(caret))
            }
            BlockFormat::H1 | BlockFormat::H2 | BlockFormat::H3 => {
                if matches!(current, Some(ElementKind::Heading(1..=3))) {
                    return Ok(None);
                }
                let level = format.heading_level().unwrap_or(1);
                self.set_element_kind(block, ElementKind::Heading(level))?;
                Ok(Some(caret))
            }
            BlockFormat::Ul => self.wrap_in_list(block, caret),
            BlockFormat::Bold | BlockFormat::Italic | BlockFormat::Link => Ok(None),
        }
    }

    // Replace `block` by a one-item bulleted list holding its inline content.
    fn wrap_in_list(&mut self, block: NodeId, caret: Caret) -> Result<Option<Caret>, TreeError> {
        let parent = self.node(block)?.parent().ok_or(TreeError::Detached(block))?;
        if matches!(self.node(parent)?.element(), Some(ElementKind::ListItem)) {
            return Ok(None);
        }
        let index = self.index_in_parent(block).ok_or(TreeError::Detached(block))?;
        let list = self.create_element(ElementKind::List { ordered: false });
        let item = self.create_element(ElementKind::ListItem);
        self.append_child(list, item)?;
        for child in self.node(block)?.children().to_vec() {
            self.append_child(item, child)?;
        }
        self.insert_child(parent, index, list)?;
        self.detach(block)?;
        let caret = if caret.node == block {
            Caret::new(item, caret.offset)
        } else {
            caret
        };
        Ok(Some(caret))
    }

    /// Wrap the characters `range` of `block` in a new inline element.
    ///
    /// Inline elements straddling either end are split, so the new element
    /// is a direct child of `block` holding exactly the range.
    ///
    /// # Errors
    /// Fails when the range is empty or outside the block text.
    pub fn wrap_inline(
        &mut self,
        block: NodeId,
        range: Range<usize>,
        kind: ElementKind,
    ) -> Result<NodeId, TreeError> {
        let len = self.text_content(block).chars().count();
        if range.start >= range.end || range.end > len {
            return Err(TreeError::OffsetOutOfRange {
                node: block,
                offset: range.end,
                len,
            });
        }
        let first = self.split_children_at(block, range.start)?;
        let last = self.split_children_at(block, range.end)?;
        let covered = self.node(block)?.children()[first..last].to_vec();
        let wrapper = self.create_element(kind);
        self.insert_child(block, first, wrapper)?;
        for child in covered {
            self.append_child(wrapper, child)?;
        }
        Ok(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(source: &str) -> Document {
        Document::parse(source).unwrap()
    }

    #[test]
    fn test_insert_text_into_leaf() {
        let mut doc = doc_with("Hello world");
        let caret = doc.caret_at_line(0, 5).unwrap();
        let caret = doc.insert_text(caret, ",").unwrap();
        assert_eq!(doc.visible_text(), "Hello, world");
        assert_eq!(caret.offset, 6);
    }

    #[test]
    fn test_insert_text_into_empty_document_creates_paragraph() {
        let mut doc = Document::empty();
        let caret = doc.end_caret();
        let caret = doc.insert_text(caret, "abc").unwrap();
        assert_eq!(doc.visible_text(), "abc");
        assert_eq!(doc.to_markdown(), "abc\n");
        assert_eq!(caret.offset, 3);
    }

    #[test]
    fn test_insert_multibyte_text() {
        let mut doc = doc_with("ab");
        let caret = doc.caret_at_line(0, 1).unwrap();
        doc.insert_text(caret, "é").unwrap();
        assert_eq!(doc.visible_text(), "aéb");
    }

    #[test]
    fn test_delete_backward_removes_char() {
        let mut doc = doc_with("Hello");
        let caret = doc.caret_at_line(0, 5).unwrap();
        let caret = doc.delete_backward(caret).unwrap();
        assert_eq!(doc.visible_text(), "Hell");
        assert_eq!(doc.caret_offset_in(doc.lines()[0].0, caret).unwrap(), 4);
    }

    #[test]
    fn test_delete_backward_across_inline_boundary() {
        let mut doc = doc_with("ab *cd*");
        let caret = doc.caret_at_line(0, 3).unwrap();
        doc.delete_backward(caret).unwrap();
        assert_eq!(doc.visible_text(), "abcd");
    }

    #[test]
    fn test_delete_backward_at_block_start_merges() {
        let mut doc = doc_with("one\n\ntwo");
        let caret = doc.caret_at_line(1, 0).unwrap();
        let caret = doc.delete_backward(caret).unwrap();
        assert_eq!(doc.visible_text(), "onetwo");
        assert_eq!(doc.caret_offset_in(doc.lines()[0].0, caret).unwrap(), 3);
    }

    #[test]
    fn test_delete_backward_at_document_start_is_noop() {
        let mut doc = doc_with("one");
        let caret = doc.caret_at_line(0, 0).unwrap();
        let after = doc.delete_backward(caret).unwrap();
        assert_eq!(doc.visible_text(), "one");
        assert_eq!(after, caret);
    }

    #[test]
    fn test_split_block_in_middle() {
        let mut doc = doc_with("Hello world");
        let caret = doc.caret_at_line(0, 5).unwrap();
        doc.split_block(caret).unwrap();
        assert_eq!(doc.visible_text(), "Hello\n world");
    }

    #[test]
    fn test_split_block_inside_emphasis() {
        let mut doc = doc_with("ab *cdef*");
        let caret = doc.caret_at_line(0, 5).unwrap();
        let caret = doc.split_block(caret).unwrap();
        assert_eq!(doc.visible_text(), "ab cd\nef");
        assert_eq!(doc.to_markdown(), "ab *cd*\n\n*ef*\n");
        assert_eq!(doc.node(caret.node).unwrap().text(), Some("ef"));
        assert_eq!(caret.offset, 0);
    }

    #[test]
    fn test_split_block_inside_nested_inline() {
        let mut doc = doc_with("x **a [link](u) b** y");
        let caret = doc.caret_at_line(0, 6).unwrap();
        doc.split_block(caret).unwrap();
        assert_eq!(doc.visible_text(), "x a li\nnk b y");
        assert_eq!(doc.to_markdown(), "x **a [li](u)**\n\n**[nk](u) b** y\n");
    }

    #[test]
    fn test_split_heading_continues_as_paragraph() {
        let mut doc = doc_with("# Title");
        let caret = doc.caret_at_line(0, 5).unwrap();
        let caret = doc.split_block(caret).unwrap();
        assert_eq!(doc.lines().len(), 2);
        assert_eq!(doc.to_markdown(), "# Title\n");
        doc.insert_text(caret, "Body").unwrap();
        assert_eq!(doc.to_markdown(), "# Title\n\nBody\n");
    }

    #[test]
    fn test_set_block_format_converts_paragraph() {
        let mut doc = doc_with("Chapter");
        let caret = doc.caret_at_line(0, 0).unwrap();
        assert_eq!(doc.set_block_format(caret, BlockFormat::H2).unwrap(), Some(caret));
        assert_eq!(doc.to_markdown(), "## Chapter\n");
    }

    #[test]
    fn test_heading_refuses_another_heading() {
        let mut doc = doc_with("## Chapter\n\n#### Small");
        let caret = doc.caret_at_line(0, 2).unwrap();
        assert_eq!(doc.set_block_format(caret, BlockFormat::H1).unwrap(), None);
        assert_eq!(doc.set_block_format(caret, BlockFormat::P).unwrap(), Some(caret));
        assert!(doc.set_block_format(caret, BlockFormat::H3).unwrap().is_some());

        let small = doc.caret_at_line(1, 0).unwrap();
        assert!(doc.set_block_format(small, BlockFormat::H1).unwrap().is_some());
        assert_eq!(doc.to_markdown(), "### Chapter\n\n# Small\n");
    }

    #[test]
    fn test_format_paragraph_as_bulleted_list() {
        let mut doc = doc_with("Intro\n\nBuy *milk*");
        let caret = doc.caret_at_line(1, 2).unwrap();
        let caret = doc.set_block_format(caret, BlockFormat::Ul).unwrap().unwrap();
        assert_eq!(doc.to_markdown(), "Intro\n\n- Buy *milk*\n");
        assert_eq!(doc.caret_offset_in(doc.lines()[1].0, caret).unwrap(), 2);

        let caret = doc.caret_at_line(1, 0).unwrap();
        assert_eq!(doc.set_block_format(caret, BlockFormat::Ul).unwrap(), None);
    }

    #[test]
    fn test_inline_formats_need_a_range() {
        let mut doc = doc_with("Plain");
        let caret = doc.caret_at_line(0, 1).unwrap();
        assert_eq!(doc.set_block_format(caret, BlockFormat::Bold).unwrap(), None);
        assert_eq!(doc.to_markdown(), "Plain\n");
    }

    #[test]
    fn test_wrap_inline_bold_around_emphasis() {
        let mut doc = doc_with("say *hello* there now");
        let block = doc.lines()[0].0;
        let kind = BlockFormat::Bold.inline_element("say hello").unwrap();
        let strong = doc.wrap_inline(block, 0..9, kind).unwrap();
        assert_eq!(doc.text_content(strong), "say hello");
        assert_eq!(doc.to_markdown(), "**say *hello*** there now\n");
    }

    #[test]
    fn test_wrap_inline_splits_straddled_emphasis() {
        let mut doc = doc_with("say *hello there* now");
        let block = doc.lines()[0].0;
        doc.wrap_inline(block, 6..12, ElementKind::Strong).unwrap();
        assert_eq!(doc.visible_text(), "say hello there now");
        assert_eq!(
            doc.to_html(),
            "<p>say <em>he</em><strong><em>llo th</em></strong><em>ere</em> now</p>"
        );
    }

    #[test]
    fn test_wrap_inline_link_uses_selected_text() {
        let mut doc = doc_with("read the guide today");
        let block = doc.lines()[0].0;
        let kind = BlockFormat::Link.inline_element("guide").unwrap();
        doc.wrap_inline(block, 9..14, kind).unwrap();
        assert_eq!(doc.to_markdown(), "read the [guide](guide) today\n");
        assert!(doc.wrap_inline(block, 4..4, ElementKind::Strong).is_err());
        assert!(doc.wrap_inline(block, 0..99, ElementKind::Strong).is_err());
    }

    #[test]
    fn test_set_block_format_ignores_code_blocks() {
        let mut doc = doc_with("```\ncode\n```");
        let caret = doc.caret_at_line(0, 0).unwrap();
        assert_eq!(doc.set_block_format(caret, BlockFormat::H1).unwrap(), None);
    }
}
