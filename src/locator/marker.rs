//! Applying and clearing the current-position marker on the document.

use std::ops::Range;

use crate::document::{CURRENT_POSITION_CLASS, Document, ElementKind, NodeId, TreeError};

/// Clear every class and inline style in the document and unwrap marker spans.
///
/// This is a sweep over the whole tree, not just the previous marker. Text
/// split apart by earlier marking is merged back, and the nodes this leaves
/// unreachable are freed. Returns how many elements were carrying the marker.
///
/// # Errors
/// Fails only if the tree is inconsistent.
pub fn clear_markers(doc: &mut Document) -> Result<usize, TreeError> {
    let nodes = doc.descendants(doc.root());
    let mut marked = 0;
    let mut spans = Vec::new();
    for &id in &nodes {
        let node = doc.node(id)?;
        if node.has_marker() {
            marked += 1;
            if node.element() == Some(&ElementKind::Span) {
                spans.push(id);
            }
        }
        if node.class().is_some() || node.style().is_some() {
            doc.set_class(id, None)?;
            doc.set_style(id, None)?;
        }
    }
    for span in spans {
        unwrap(doc, span)?;
    }
    for id in nodes {
        if doc.is_attached(id) && !doc.node(id)?.is_leaf() {
            doc.normalize(id)?;
        }
    }
    doc.reclaim_detached();
    Ok(marked)
}

// Replace `span` by its children.
fn unwrap(doc: &mut Document, span: NodeId) -> Result<(), TreeError> {
    let parent = doc.node(span)?.parent().ok_or(TreeError::Detached(span))?;
    let index = doc.index_in_parent(span).ok_or(TreeError::Detached(span))?;
    let children = doc.node(span)?.children().to_vec();
    for (offset, child) in children.into_iter().enumerate() {
        doc.insert_child(parent, index + offset, child)?;
    }
    doc.detach(span)
}

/// Tag `block` as the current line.
///
/// # Errors
/// Fails for unknown nodes.
pub fn mark_block(doc: &mut Document, block: NodeId) -> Result<(), TreeError> {
    doc.set_class(block, Some(CURRENT_POSITION_CLASS))
}

/// Wrap the characters `range` of `paragraph` in a marker span.
///
/// Text leaves are split at the range ends. When an end falls inside an
/// inline element (emphasis, link, ...) the span widens to take the whole
/// element, so the span is always a direct child of `paragraph`.
///
/// # Errors
/// Fails when the range is empty or outside the paragraph text.
pub fn wrap_sentence(
    doc: &mut Document,
    paragraph: NodeId,
    range: Range<usize>,
) -> Result<NodeId, TreeError> {
    let len = doc.text_content(paragraph).chars().count();
    if range.start >= range.end || range.end > len {
        return Err(TreeError::OffsetOutOfRange {
            node: paragraph,
            offset: range.end,
            len,
        });
    }

    let mut touched = Vec::new();
    for boundary in [range.start, range.end] {
        if let Some(parent) = split_leaf_at(doc, paragraph, boundary)? {
            touched.push(parent);
        }
    }

    let children = doc.node(paragraph)?.children().to_vec();
    let mut covered = Vec::new();
    let mut acc = 0;
    for child in children {
        let child_len = doc.text_content(child).chars().count();
        let (start, end) = (acc, acc + child_len);
        acc = end;
        let overlaps = if child_len == 0 {
            range.start < start && start < range.end
        } else {
            start < range.end && end > range.start
        };
        if overlaps {
            covered.push(child);
        }
    }
    let Some(&first) = covered.first() else {
        return Err(TreeError::OffsetOutOfRange {
            node: paragraph,
            offset: range.start,
            len,
        });
    };

    let index = doc.index_in_parent(first).ok_or(TreeError::Detached(first))?;
    let span = doc.create_element(ElementKind::Span);
    doc.set_class(span, Some(CURRENT_POSITION_CLASS))?;
    doc.insert_child(paragraph, index, span)?;
    for child in covered {
        doc.append_child(span, child)?;
    }
    // Splits inside a widened element are no longer needed.
    for parent in touched {
        if parent != paragraph {
            doc.normalize(parent)?;
        }
    }
    Ok(span)
}

// Split the text leaf that straddles `offset`, returning its parent when a
// split happened.
fn split_leaf_at(
    doc: &mut Document,
    within: NodeId,
    offset: usize,
) -> Result<Option<NodeId>, TreeError> {
    let mut acc = 0;
    for id in doc.descendants(within) {
        let node = doc.node(id)?;
        if !node.is_leaf() {
            continue;
        }
        let len = node.leaf_len();
        if acc < offset && offset < acc + len {
            let parent = node.parent();
            doc.split_text(id, offset - acc)?;
            return Ok(parent);
        }
        acc += len;
        if acc >= offset {
            break;
        }
    }
    Ok(None)
}
