//! Splitting paragraph text into sentences.
//!
//! A sentence is a run of characters other than line breaks and `.!?`,
//! followed by one or more terminators or by the end of the line. Line
//! breaks separate sentences and never belong to one. All ranges count
//! characters, not bytes.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\n|[^\r\n.!?]+(?:[.!?]+|$)").expect("Invalid sentence regex")
});

/// One sentence of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Range of the match, surrounding whitespace included.
    pub span: Range<usize>,
    /// Range of the trimmed sentence.
    pub range: Range<usize>,
    /// Trimmed text.
    pub text: String,
}

/// Split `text` into sentences, in order.
///
/// Line-break matches and whitespace-only runs are dropped.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut out = Vec::new();
    // Byte-to-char conversion walks forward with the matches.
    let mut chars_seen = 0;
    let mut bytes_seen = 0;
    for found in SENTENCE.find_iter(text) {
        chars_seen += text[bytes_seen..found.start()].chars().count();
        let raw = found.as_str();
        let start = chars_seen;
        let len = raw.chars().count();
        chars_seen += len;
        bytes_seen = found.end();

        let trimmed = raw.trim();
        if raw == "\n" || trimmed.is_empty() {
            continue;
        }
        let leading = raw.chars().take_while(|c| c.is_whitespace()).count();
        let trimmed_len = trimmed.chars().count();
        out.push(Sentence {
            span: start..start + len,
            range: start + leading..start + leading + trimmed_len,
            text: trimmed.to_string(),
        });
    }
    out
}

/// The sentence containing the caret at character offset `caret`.
///
/// Containment is inclusive at both ends of the untrimmed span, so a caret
/// sitting between two sentences belongs to the first one.
pub fn sentence_at(text: &str, caret: usize) -> Option<Sentence> {
    containing(split_sentences(text), caret)
}

/// The sentence worth highlighting on its own: the one under the caret,
/// provided the text holds at least two sentences.
pub fn highlighted_sentence(text: &str, caret: usize) -> Option<Sentence> {
    let sentences = split_sentences(text);
    if sentences.len() < 2 {
        return None;
    }
    containing(sentences, caret)
}

fn containing(sentences: Vec<Sentence>, caret: usize) -> Option<Sentence> {
    sentences
        .into_iter()
        .find(|s| s.span.start <= caret && caret <= s.span.end)
}
