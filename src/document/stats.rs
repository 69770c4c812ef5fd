//! Status-bar counters and the heading map shown beside the surface.

use serde::Serialize;

use super::types::{Document, ElementKind};

/// Character and word counters for the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    pub chars: usize,
    pub words: usize,
}

/// One entry of the heading map: a level-2 heading and where it sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapPointer {
    pub title: String,
    /// Position as a whole percentage of the document's visible lines.
    pub percent: u8,
}

/// Count characters and words of the visible text.
///
/// Leading and trailing whitespace is ignored; words are runs separated by
/// whitespace.
pub fn counts(doc: &Document) -> Counts {
    let text = doc.visible_text();
    let trimmed = text.trim();
    Counts {
        chars: trimmed.chars().count(),
        words: trimmed.split_whitespace().count(),
    }
}

/// Build the heading map: one pointer per level-2 heading.
pub fn heading_map(doc: &Document) -> Vec<MapPointer> {
    let lines = doc.lines();
    let total = lines.len();
    lines
        .iter()
        .enumerate()
        .filter(|(_, (block, _))| {
            doc.get(*block)
                .and_then(|n| n.element())
                .is_some_and(|kind| *kind == ElementKind::Heading(2))
        })
        .map(|(index, (_, title))| MapPointer {
            title: title.trim().to_string(),
            percent: u8::try_from(index * 100 / total).unwrap_or(100),
        })
        .collect()
}
