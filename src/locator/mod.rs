//! Current line and sentence highlighting.
//!
//! On every key-up and click the locator clears all markers, walks up from
//! the caret to the enclosing line block and tags it. Inside a paragraph
//! with more than one sentence only the sentence under the caret is tagged,
//! by wrapping it in a marker span.

pub mod block;
pub mod marker;
pub mod sentence;

use std::ops::Range;

use serde::Serialize;

use crate::document::{Caret, Document, NodeId, TreeError};
use crate::perf::DebugEvent;

pub use block::{LineKind, NodeTree, WalkError, enclosing_block};
pub use marker::{clear_markers, mark_block, wrap_sentence};
pub use sentence::{Sentence, highlighted_sentence, sentence_at, split_sentences};

/// Switches read from the config flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Whether to highlight at all (`--no-highlight` clears this).
    pub enabled: bool,
    /// Whether paragraphs get the sentence pass (`--no-sentences`).
    pub sentences: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sentences: true,
        }
    }
}

/// What a recompute marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum LocateOutcome {
    /// A whole block carries the marker.
    Block { block: NodeId, kind: LineKind },
    /// One sentence of a paragraph was wrapped in a marker span.
    Sentence {
        paragraph: NodeId,
        span: NodeId,
        range: Range<usize>,
        text: String,
    },
    /// The caret is outside every line block.
    Nothing,
}

/// Result of a recompute: what was marked and where the caret now sits.
///
/// Marking splits and merges text leaves, so the caret is re-resolved to
/// the same character position in the rewritten tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub outcome: LocateOutcome,
    pub caret: Caret,
}

/// Stateless recompute of the current-line marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineLocator {
    options: LocatorOptions,
}

impl LineLocator {
    pub const fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> LocatorOptions {
        self.options
    }

    /// Recompute the marker for `caret`.
    ///
    /// Without a caret nothing happens, not even the sweep. After a
    /// successful call at most one element carries the marker.
    ///
    /// # Errors
    /// Fails when the caret points at an unknown or detached node, or the
    /// tree walk does not terminate. The document may then be partly swept.
    pub fn locate(
        &self,
        doc: &mut Document,
        caret: Option<Caret>,
    ) -> Result<Option<Located>, TreeError> {
        let Some(caret) = caret else {
            return Ok(None);
        };
        if !self.options.enabled {
            return Ok(Some(Located {
                outcome: LocateOutcome::Nothing,
                caret,
            }));
        }
        let _scope = crate::perf::scope("locator.locate");
        doc.node(caret.node)?;
        if !doc.is_attached(caret.node) {
            return Err(TreeError::Detached(caret.node));
        }

        let anchor = doc.block_of(caret.node)?;
        let offset = doc.caret_offset_in(anchor, caret)?;
        let cleared = clear_markers(doc)?;
        let caret = doc.caret_in(anchor, offset);

        let outcome = match enclosing_block(doc, doc.root(), caret.node)? {
            None => LocateOutcome::Nothing,
            Some((paragraph, LineKind::Paragraph)) if self.options.sentences => {
                mark_paragraph(doc, paragraph, caret)?
            }
            Some((block, kind)) => {
                mark_block(doc, block)?;
                LocateOutcome::Block { block, kind }
            }
        };
        let caret = doc.caret_in(anchor, offset);

        tracing::debug!(?outcome, cleared, "current line recomputed");
        crate::perf::record(DebugEvent::LineLocated {
            outcome: &outcome,
            cleared,
        });
        Ok(Some(Located { outcome, caret }))
    }
}

// Wrap the sentence under the caret, or mark the whole paragraph when it
// has fewer than two sentences.
fn mark_paragraph(
    doc: &mut Document,
    paragraph: NodeId,
    caret: Caret,
) -> Result<LocateOutcome, TreeError> {
    let text = doc.text_content(paragraph);
    let offset = doc.caret_offset_in(paragraph, caret)?;
    let Some(sentence) = highlighted_sentence(&text, offset) else {
        mark_block(doc, paragraph)?;
        return Ok(LocateOutcome::Block {
            block: paragraph,
            kind: LineKind::Paragraph,
        });
    };
    let span = wrap_sentence(doc, paragraph, sentence.range.clone())?;
    Ok(LocateOutcome::Sentence {
        paragraph,
        span,
        range: sentence.range,
        text: sentence.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CURRENT_POSITION_CLASS, ElementKind};

    const SAMPLE: &str = "Hello world. How are you? Fine.";

    fn locate_at(doc: &mut Document, line: usize, offset: usize) -> Located {
        let caret = doc.caret_at_line(line, offset);
        LineLocator::default().locate(doc, caret).unwrap().unwrap()
    }

    fn sentence_text(outcome: &LocateOutcome) -> &str {
        match outcome {
            LocateOutcome::Sentence { text, .. } => text,
            other => panic!("expected a sentence, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_serialises_with_its_line_kind() {
        let doc = Document::parse("Just one line").unwrap();
        let block = doc.lines()[0].0;
        let outcome = LocateOutcome::Block {
            block,
            kind: LineKind::Paragraph,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "block");
        assert_eq!(json["kind"], "paragraph");
        assert_eq!(json["block"]["index"], block.index());
        assert_eq!(
            serde_json::to_value(LocateOutcome::Nothing).unwrap(),
            serde_json::json!({ "outcome": "nothing" })
        );
    }

    #[test]
    fn test_caret_in_first_sentence() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let located = locate_at(&mut doc, 0, 5);
        assert_eq!(sentence_text(&located.outcome), "Hello world.");
        assert_eq!(
            doc.to_html(),
            "<p><span class=\"current-position\">Hello world.</span> How are you? Fine.</p>"
        );
    }

    #[test]
    fn test_caret_in_second_sentence() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let located = locate_at(&mut doc, 0, 20);
        assert_eq!(sentence_text(&located.outcome), "How are you?");
        let LocateOutcome::Sentence { range, .. } = located.outcome else {
            unreachable!()
        };
        assert_eq!(range, 13..25);
    }

    #[test]
    fn test_caret_is_remapped_to_same_position() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let located = locate_at(&mut doc, 0, 20);
        let (block, _) = doc.lines()[0].clone();
        assert_eq!(doc.caret_offset_in(block, located.caret).unwrap(), 20);
        let node = doc.node(located.caret.node).unwrap();
        assert_eq!(node.text(), Some("How are you?"));
    }

    #[test]
    fn test_three_marked_paragraphs_leave_one_marker() {
        let mut doc = Document::parse("One. Two.\n\nThree. Four.\n\nFive. Six.").unwrap();
        let blocks: Vec<_> = doc.lines().into_iter().map(|(id, _)| id).collect();
        // Leave stale markers from earlier recomputes on every paragraph.
        wrap_sentence(&mut doc, blocks[0], 0..4).unwrap();
        mark_block(&mut doc, blocks[1]).unwrap();
        doc.set_class(blocks[2], Some(CURRENT_POSITION_CLASS)).unwrap();
        assert_eq!(doc.marked_elements().len(), 3);

        locate_at(&mut doc, 1, 2);
        let marked = doc.marked_elements();
        assert_eq!(marked.len(), 1);
        assert_eq!(doc.text_content(marked[0]), "Three.");
    }

    #[test]
    fn test_heading_is_marked_without_sentence_split() {
        let mut doc = Document::parse("## Part one. Part two.\n\nBody.").unwrap();
        let located = locate_at(&mut doc, 0, 3);
        let (heading, _) = doc.lines()[0].clone();
        assert_eq!(
            located.outcome,
            LocateOutcome::Block {
                block: heading,
                kind: LineKind::Heading(2)
            }
        );
        assert_eq!(
            doc.to_html(),
            "<h2 class=\"current-position\">Part one. Part two.</h2><p>Body.</p>"
        );
    }

    #[test]
    fn test_single_sentence_paragraph_marks_paragraph() {
        let mut doc = Document::parse("Just one sentence.").unwrap();
        let located = locate_at(&mut doc, 0, 4);
        let (p, _) = doc.lines()[0].clone();
        assert_eq!(
            located.outcome,
            LocateOutcome::Block {
                block: p,
                kind: LineKind::Paragraph
            }
        );
    }

    #[test]
    fn test_list_item_is_marked() {
        let mut doc = Document::parse("- first. second.\n- third").unwrap();
        let located = locate_at(&mut doc, 1, 2);
        assert!(matches!(
            located.outcome,
            LocateOutcome::Block {
                kind: LineKind::ListItem,
                ..
            }
        ));
    }

    #[test]
    fn test_no_caret_changes_nothing() {
        let mut doc = Document::parse("A. B.").unwrap();
        let (p, _) = doc.lines()[0].clone();
        mark_block(&mut doc, p).unwrap();
        let before = doc.to_html();
        assert_eq!(LineLocator::default().locate(&mut doc, None).unwrap(), None);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_code_block_is_not_a_line() {
        let mut doc = Document::parse("Intro.\n\n```\ncode\n```").unwrap();
        locate_at(&mut doc, 0, 1);
        let located = locate_at(&mut doc, 1, 2);
        assert_eq!(located.outcome, LocateOutcome::Nothing);
        assert!(doc.marked_elements().is_empty());
    }

    #[test]
    fn test_sentences_disabled_marks_paragraph() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let caret = doc.caret_at_line(0, 20);
        let locator = LineLocator::new(LocatorOptions {
            enabled: true,
            sentences: false,
        });
        let located = locator.locate(&mut doc, caret).unwrap().unwrap();
        assert!(matches!(located.outcome, LocateOutcome::Block { .. }));
    }

    #[test]
    fn test_highlight_disabled_leaves_document_alone() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let caret = doc.caret_at_line(0, 20);
        let locator = LineLocator::new(LocatorOptions {
            enabled: false,
            sentences: true,
        });
        let located = locator.locate(&mut doc, caret).unwrap().unwrap();
        assert_eq!(located.outcome, LocateOutcome::Nothing);
        assert!(doc.marked_elements().is_empty());
    }

    #[test]
    fn test_detached_caret_is_an_error() {
        let mut doc = Document::parse("A. B.\n\nC.").unwrap();
        let caret = doc.caret_at_line(0, 1).unwrap();
        let (p, _) = doc.lines()[0].clone();
        doc.detach(p).unwrap();
        let err = LineLocator::default().locate(&mut doc, Some(caret));
        assert!(matches!(err, Err(TreeError::Detached(_))));
    }

    #[test]
    fn test_moving_between_sentences_keeps_text_intact() {
        let mut doc = Document::parse("Alpha *beta*. Gamma! Delta?").unwrap();
        let markdown = doc.to_markdown();
        for offset in [0, 3, 8, 13, 16, 22, 26] {
            locate_at(&mut doc, 0, offset);
            assert_eq!(doc.marked_elements().len(), 1);
            assert_eq!(doc.visible_text(), "Alpha beta. Gamma! Delta?");
        }
        assert_eq!(doc.to_markdown(), markdown);
        assert!(
            doc.descendants(doc.root())
                .iter()
                .filter(|&&id| doc.node(id).unwrap().element() == Some(&ElementKind::Span))
                .count()
                <= 1
        );
    }

    mod property_tests {
        use super::super::*;
        use proptest::prelude::*;

        const SOURCE: &str =
            "# Title\n\nFirst. Second *third*! Fourth?\n\n- one. two\n- three\n\nLast line.\nWrapped.";

        proptest! {
            #[test]
            fn at_most_one_marker_after_any_clicks(
                clicks in prop::collection::vec((0usize..6, 0usize..40), 1..20)
            ) {
                let mut doc = Document::parse(SOURCE).unwrap();
                let text = doc.visible_text();
                let locator = LineLocator::default();
                for (line, offset) in clicks {
                    let caret = doc.caret_at_line(line, offset);
                    locator.locate(&mut doc, caret).unwrap();
                    prop_assert!(doc.marked_elements().len() <= 1);
                    prop_assert_eq!(doc.visible_text(), text.clone());
                }
            }
        }
    }
}
