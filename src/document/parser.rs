//! Markdown parsing with comrak.

use anyhow::{Context, Result};
use comrak::nodes::{AstNode, ListType, NodeCode, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use super::types::{ColumnAlign, Document, ElementKind, NodeId, NodeKind};
use crate::perf::DebugEvent;

impl Document {
    /// Parse markdown source into a Document.
    ///
    /// # Example
    ///
    /// ```
    /// use andika::document::Document;
    ///
    /// let doc = Document::parse("# Hello\n\nWorld").unwrap();
    /// assert_eq!(doc.visible_text(), "Hello\nWorld");
    /// ```
    ///
    /// # Errors
    /// Fails if the parsed tree cannot be assembled into the document arena.
    pub fn parse(source: &str) -> Result<Self> {
        parse(source)
    }
}

/// Parse markdown source into a Document.
///
/// # Errors
/// Fails if the parsed tree cannot be assembled into the document arena.
pub fn parse(source: &str) -> Result<Document> {
    let _scope = crate::perf::scope("document.parse");
    let arena = Arena::new();
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;

    let root = parse_document(&arena, source, &options);

    let mut doc = Document::empty();
    let doc_root = doc.root();
    for child in root.children() {
        process_node(child, &mut doc, doc_root).context("failed to assemble document")?;
    }
    crate::perf::record(DebugEvent::DocumentParsed {
        bytes: source.len(),
        nodes: doc.node_count(),
    });
    Ok(doc)
}

fn process_node<'a>(
    node: &'a AstNode<'a>,
    doc: &mut Document,
    parent: NodeId,
) -> Result<()> {
    let element = match &node.data.borrow().value {
        // Tight list items hold their text directly, as `<li>text</li>`.
        NodeValue::Paragraph if in_tight_list(node) => None,
        NodeValue::Paragraph => Some(ElementKind::Paragraph),
        NodeValue::Heading(heading) => Some(ElementKind::Heading(heading.level)),
        NodeValue::List(list) => Some(ElementKind::List {
            ordered: list.list_type == ListType::Ordered,
        }),
        NodeValue::Item(_) | NodeValue::TaskItem(_) => Some(ElementKind::ListItem),
        NodeValue::BlockQuote => Some(ElementKind::BlockQuote),
        NodeValue::Table(table) => Some(ElementKind::Table {
            alignments: table.alignments.iter().map(column_align).collect(),
        }),
        NodeValue::TableRow(header) => Some(ElementKind::TableRow { header: *header }),
        NodeValue::TableCell => Some(ElementKind::TableCell),
        NodeValue::Emph => Some(ElementKind::Emphasis),
        NodeValue::Strong => Some(ElementKind::Strong),
        NodeValue::Strikethrough => Some(ElementKind::Strikethrough),
        NodeValue::Link(link) => Some(ElementKind::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        }),
        NodeValue::Image(link) => {
            let alt = node
                .descendants()
                .filter_map(|d| match &d.data.borrow().value {
                    NodeValue::Text(text) | NodeValue::Code(NodeCode { literal: text, .. }) => {
                        Some(text.clone())
                    }
                    _ => None,
                })
                .collect::<String>();
            let image = doc.create_element(ElementKind::Image {
                url: link.url.clone(),
                title: link.title.clone(),
                alt,
            });
            doc.append_child(parent, image)?;
            return Ok(());
        }
        NodeValue::ThematicBreak => {
            let rule = doc.create_element(ElementKind::Rule);
            doc.append_child(parent, rule)?;
            return Ok(());
        }
        NodeValue::CodeBlock(code) => {
            let block = doc.create_element(ElementKind::CodeBlock {
                info: code.info.clone(),
            });
            let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
            if !literal.is_empty() {
                let text = doc.create_text(literal);
                doc.append_child(block, text)?;
            }
            doc.append_child(parent, block)?;
            return Ok(());
        }
        NodeValue::HtmlBlock(html) => {
            let block = doc.create_element(ElementKind::HtmlBlock);
            let literal = html.literal.trim_end_matches('\n');
            if !literal.is_empty() {
                let text = doc.create_text(literal);
                doc.append_child(block, text)?;
            }
            doc.append_child(parent, block)?;
            return Ok(());
        }
        NodeValue::Code(code) => {
            let inline = doc.create_element(ElementKind::Code);
            let text = doc.create_text(code.literal.as_str());
            doc.append_child(inline, text)?;
            doc.append_child(parent, inline)?;
            return Ok(());
        }
        NodeValue::Text(text) => {
            push_text(doc, parent, text)?;
            return Ok(());
        }
        NodeValue::HtmlInline(html) => {
            let inline = doc.create_element(ElementKind::InlineHtml);
            let text = doc.create_text(html.as_str());
            doc.append_child(inline, text)?;
            doc.append_child(parent, inline)?;
            return Ok(());
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            let line_break = doc.create(NodeKind::LineBreak);
            doc.append_child(parent, line_break)?;
            return Ok(());
        }
        // Everything else (front matter, footnotes, ...) is transparent:
        // its children land in the current parent.
        _ => None,
    };

    let target = match element {
        Some(kind) => {
            let id = doc.create_element(kind);
            doc.append_child(parent, id)?;
            id
        }
        None => parent,
    };
    for child in node.children() {
        process_node(child, doc, target)?;
    }
    Ok(())
}

const fn column_align(align: &TableAlignment) -> ColumnAlign {
    match align {
        TableAlignment::None => ColumnAlign::None,
        TableAlignment::Left => ColumnAlign::Left,
        TableAlignment::Center => ColumnAlign::Center,
        TableAlignment::Right => ColumnAlign::Right,
    }
}

fn in_tight_list<'a>(paragraph: &'a AstNode<'a>) -> bool {
    paragraph
        .parent()
        .and_then(|item| item.parent())
        .is_some_and(|list| matches!(&list.data.borrow().value, NodeValue::List(list) if list.tight))
}

// Adjacent text events (comrak splits on some punctuation) merge into one leaf.
fn push_text(doc: &mut Document, parent: NodeId, text: &str) -> Result<()> {
    let last = doc.node(parent)?.children().last().copied();
    if let Some(last) = last.filter(|&id| doc.get(id).is_some_and(|n| n.text().is_some())) {
        doc.text_mut(last)?.push_str(text);
        return Ok(());
    }
    let leaf = doc.create_text(text);
    doc.append_child(parent, leaf)?;
    Ok(())
}
