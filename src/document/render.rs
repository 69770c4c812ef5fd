//! Serialising the document back to Markdown and HTML.
//!
//! Markdown is what the host writes to disk. HTML mirrors the live surface,
//! markers included, and is what tests and debug output inspect.

use std::fmt::Write as _;

use super::types::{ColumnAlign, Document, ElementKind, NodeId, NodeKind};

impl Document {
    /// Serialise the document as Markdown.
    ///
    /// Marker spans and attributes are transparent.
    pub fn to_markdown(&self) -> String {
        let blocks = self.render_children_md(self.root());
        if blocks.is_empty() {
            String::new()
        } else {
            format!("{}\n", blocks.join("\n\n"))
        }
    }

    /// Serialise the document as HTML, including classes and inline styles.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(node) = self.get(self.root()) {
            for &child in node.children() {
                self.write_html(child, &mut out);
            }
        }
        out
    }

    fn render_children_md(&self, id: NodeId) -> Vec<String> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut blocks = Vec::new();
        let mut inline = String::new();
        for &child in node.children() {
            let Some(child_node) = self.get(child) else { continue };
            if child_node.is_block() {
                if !inline.is_empty() {
                    blocks.push(std::mem::take(&mut inline));
                }
                let rendered = self.render_block_md(child);
                if !rendered.is_empty() {
                    blocks.push(rendered);
                }
            } else {
                inline.push_str(&self.render_inline_md(child));
            }
        }
        if !inline.is_empty() {
            blocks.push(inline);
        }
        blocks
    }

    fn render_block_md(&self, id: NodeId) -> String {
        let Some(kind) = self.get(id).and_then(|n| n.element()) else {
            return String::new();
        };
        match kind {
            ElementKind::Heading(level) => {
                let hashes = "#".repeat(usize::from(*level).clamp(1, 6));
                format!("{hashes} {}", self.inline_children_md(id))
            }
            ElementKind::Paragraph => self.paragraph_md(id),
            ElementKind::List { ordered } => {
                let items = self.get(id).map(|n| n.children().to_vec()).unwrap_or_default();
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, &item)| {
                        let marker = if *ordered {
                            format!("{}. ", idx + 1)
                        } else {
                            "- ".to_string()
                        };
                        let body = self.render_children_md(item).join("\n");
                        indent_continuation(&marker, &body)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ElementKind::ListItem => {
                indent_continuation("- ", &self.render_children_md(id).join("\n"))
            }
            ElementKind::BlockQuote => self
                .render_children_md(id)
                .join("\n\n")
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ElementKind::CodeBlock { info } => {
                format!("```{info}\n{}\n```", self.text_content(id))
            }
            ElementKind::Rule => "---".to_string(),
            ElementKind::Table { alignments } => self.table_md(id, alignments),
            ElementKind::TableRow { .. } => self.row_md(id),
            ElementKind::HtmlBlock => self.text_content(id),
            ElementKind::Container => self.render_children_md(id).join("\n\n"),
            _ => self.inline_children_md(id),
        }
    }

    // A paragraph whose text would read as block syntax gets that syntax
    // escaped.
    fn paragraph_md(&self, id: NodeId) -> String {
        let inline = self.inline_children_md(id);
        let starts_with_text = self
            .get(id)
            .and_then(|n| n.children().first())
            .and_then(|&first| self.get(first))
            .is_some_and(|first| first.text().is_some());
        if starts_with_text {
            escape_block_start(&inline)
        } else {
            inline
        }
    }

    fn table_md(&self, id: NodeId, alignments: &[ColumnAlign]) -> String {
        let rows = self.get(id).map(|n| n.children().to_vec()).unwrap_or_default();
        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (idx, &row) in rows.iter().enumerate() {
            lines.push(self.row_md(row));
            if idx == 0 {
                let delimiters = alignments
                    .iter()
                    .map(|align| match align {
                        ColumnAlign::None => "---",
                        ColumnAlign::Left => ":--",
                        ColumnAlign::Center => ":-:",
                        ColumnAlign::Right => "--:",
                    })
                    .collect::<Vec<_>>();
                lines.push(format!("| {} |", delimiters.join(" | ")));
            }
        }
        lines.join("\n")
    }

    fn row_md(&self, id: NodeId) -> String {
        let cells = self
            .get(id)
            .map(|n| {
                n.children()
                    .iter()
                    .map(|&cell| self.inline_children_md(cell).replace('|', "\\|"))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        format!("| {} |", cells.join(" | "))
    }

    fn inline_children_md(&self, id: NodeId) -> String {
        self.get(id)
            .map(|n| {
                n.children()
                    .iter()
                    .map(|&c| self.render_inline_md(c))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn render_inline_md(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        match node.kind() {
            NodeKind::Text(text) => escape_markdown(text),
            NodeKind::LineBreak => "\n".to_string(),
            NodeKind::Root => String::new(),
            NodeKind::Element(kind) => match kind {
                ElementKind::Emphasis => format!("*{}*", self.inline_children_md(id)),
                ElementKind::Strong => format!("**{}**", self.inline_children_md(id)),
                ElementKind::Strikethrough => format!("~~{}~~", self.inline_children_md(id)),
                ElementKind::Code => code_span(&self.text_content(id)),
                ElementKind::Link { url, title } => {
                    format!("[{}]({})", self.inline_children_md(id), destination(url, title))
                }
                ElementKind::Image { url, title, alt } => {
                    format!("![{}]({})", escape_markdown(alt), destination(url, title))
                }
                ElementKind::InlineHtml => self.text_content(id),
                _ => self.inline_children_md(id),
            },
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match node.kind() {
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::LineBreak => out.push_str("<br>"),
            NodeKind::Root => {}
            NodeKind::Element(kind) => {
                let tag = kind.tag();
                out.push('<');
                out.push_str(tag);
                match kind {
                    ElementKind::Link { url, .. } => {
                        let _ = write!(
                            out,
                            " href=\"{}\"",
                            html_escape::encode_double_quoted_attribute(url)
                        );
                    }
                    ElementKind::Image { url, alt, .. } => {
                        let _ = write!(
                            out,
                            " src=\"{}\" alt=\"{}\"",
                            html_escape::encode_double_quoted_attribute(url),
                            html_escape::encode_double_quoted_attribute(alt)
                        );
                    }
                    _ => {}
                }
                if let Some(class) = node.class() {
                    let _ = write!(
                        out,
                        " class=\"{}\"",
                        html_escape::encode_double_quoted_attribute(class)
                    );
                }
                if let Some(style) = node.style() {
                    let _ = write!(
                        out,
                        " style=\"{}\"",
                        html_escape::encode_double_quoted_attribute(style)
                    );
                }
                out.push('>');
                if matches!(kind, ElementKind::Rule | ElementKind::Image { .. }) {
                    return;
                }
                let code_block = matches!(kind, ElementKind::CodeBlock { .. });
                if code_block {
                    out.push_str("<code>");
                }
                for &child in node.children() {
                    self.write_html(child, out);
                }
                if code_block {
                    out.push_str("</code>");
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

// Backslash-escape characters that would otherwise read as inline markup.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_block_start(line: &str) -> String {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        return if rest.starts_with(['.', ')']) {
            format!("{}\\{rest}", &line[..digits])
        } else {
            line.to_string()
        };
    }
    if line.starts_with(['#', '>', '-', '+', '=']) {
        format!("\\{line}")
    } else {
        line.to_string()
    }
}

fn code_span(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        run = if c == '`' { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    let fence = "`".repeat(longest + 1);
    if longest > 0 {
        format!("{fence} {code} {fence}")
    } else {
        format!("{fence}{code}{fence}")
    }
}

fn destination(url: &str, title: &str) -> String {
    if title.is_empty() {
        url.to_string()
    } else {
        format!("{url} \"{}\"", title.replace('"', "\\\""))
    }
}

fn indent_continuation(marker: &str, body: &str) -> String {
    let pad = " ".repeat(marker.chars().count());
    let mut out = String::with_capacity(body.len() + marker.len());
    for (idx, line) in body.lines().enumerate() {
        if idx == 0 {
            out.push_str(marker);
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&pad);
            }
        }
        out.push_str(line);
    }
    if out.is_empty() {
        out.push_str(marker.trim_end());
    }
    out
}
