use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::model::{Origin, Selection};
use crate::app::{HostSignal, Model};
use crate::document::{BlockFormat, Caret, Document, TreeError};
use crate::editor::ScrollAnimation;
use crate::perf::DebugEvent;

/// Notification shown when an opened file is not markdown.
pub const INVALID_FILE_MESSAGE: &str = "Error: file is not a valid .md or .markdown file";

/// Where a scroll-to request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollTarget {
    Top,
    Bottom,
    /// A visible line; the caret stays where it is
    Offset(usize),
}

/// All messages the session reacts to.
///
/// Host requests, input events from the surface, and edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Message {
    // Host
    /// Start a fresh untitled document
    NewFile,
    /// Install the contents of a file
    OpenFile { path: PathBuf, contents: String },
    /// The host finished writing the document, possibly to a new path
    FileSaved { path: Option<PathBuf> },
    /// The host wants the markdown to write
    SaveRequested,
    /// Convert the caret's block, or wrap the selection
    FormatTo(BlockFormat),
    /// Scroll to the first/last line (moving the caret) or to a line
    ScrollTo(ScrollTarget),
    /// Animation frame, `elapsed_ms` since the scroll started
    Frame { elapsed_ms: u64 },

    // Input events
    KeyDown,
    KeyUp,
    /// Click at a caret position.
    ///
    /// Node ids are only meaningful to a host sharing the session's
    /// document; hosts on the JSON channel send `click-line` instead.
    Click(Caret),
    /// Click at a character offset of a visible line
    ClickLine { line: usize, offset: usize },
    /// Select characters `start..end` of a visible line
    Select { line: usize, start: usize, end: usize },
    /// Caret moved without a click (arrow keys)
    MoveCaret(Caret),

    // Edits
    InsertText(String),
    DeleteBackward,
    SplitBlock,
}

/// Pure function that updates the model based on a message.
///
/// Host-bound effects are queued on the model as [`HostSignal`]s.
pub fn update(mut model: Model, msg: Message) -> Model {
    tracing::debug!(?msg, "update");
    match msg {
        // Host
        Message::NewFile => {
            model.install(Document::empty(), Origin::Blank);
        }
        Message::OpenFile { path, contents } => open_file(&mut model, path, &contents),
        Message::FileSaved { path } => {
            if let Some(path) = path {
                model.origin = Origin::File(path);
            }
            model.reset_baseline();
            model.send(HostSignal::notify("File saved"));
        }
        Message::SaveRequested => {
            let signal = HostSignal::Save {
                path: model.path().map(Path::to_path_buf),
                markdown: model.document.to_markdown(),
            };
            model.send(signal);
        }
        Message::FormatTo(format) if format.is_inline() => format_selection(&mut model, format),
        Message::FormatTo(format) => {
            if let Some(caret) = model.caret {
                match model.document.set_block_format(caret, format) {
                    Ok(Some(caret)) => {
                        model.caret = Some(caret);
                        model.selection = None;
                        model.document.reclaim_detached();
                        model.refresh_current_line();
                        model.refresh_map();
                    }
                    Ok(None) => {}
                    Err(err) => discard_edit("format-to", &err),
                }
            }
        }
        Message::ScrollTo(target) => scroll_to(&mut model, target),
        Message::Frame { elapsed_ms } => {
            if let Some(anim) = model.scroll {
                let elapsed = Duration::from_millis(elapsed_ms);
                model.scroll_top = anim.position_at(elapsed);
                if anim.is_finished(elapsed) {
                    model.scroll = None;
                }
            }
        }

        // Input events
        Message::KeyDown => {
            if model.origin == Origin::Blank && model.document.char_count() > 0 {
                model.origin = Origin::NewFile;
                model.send(HostSignal::InitNewFile);
            }
        }
        Message::KeyUp => {
            model.refresh_counts();
            model.refresh_modified();
            model.refresh_current_line();
            model.refresh_map();
        }
        Message::Click(caret) => {
            model.caret = Some(caret);
            model.selection = None;
            model.refresh_current_line();
            model.refresh_map();
        }
        Message::ClickLine { line, offset } => {
            model.caret = model.document.caret_at_line(line, offset);
            model.selection = None;
            model.refresh_current_line();
            model.refresh_map();
        }
        Message::Select { line, start, end } => {
            let range = start.min(end)..start.max(end);
            model.selection = model
                .document
                .lines()
                .get(line)
                .map(|(block, _)| Selection {
                    block: *block,
                    range: range.clone(),
                })
                .filter(|selection| !selection.range.is_empty());
            model.caret = model.document.caret_at_line(line, range.end);
            model.refresh_current_line();
            model.refresh_map();
        }
        Message::MoveCaret(caret) => {
            model.caret = Some(caret);
            model.selection = None;
        }

        // Edits
        Message::InsertText(text) => {
            let caret = model.caret.unwrap_or_else(|| model.document.end_caret());
            apply_edit(&mut model, "insert-text", |doc| doc.insert_text(caret, &text));
        }
        Message::DeleteBackward => {
            if let Some(caret) = model.caret {
                apply_edit(&mut model, "delete-backward", |doc| doc.delete_backward(caret));
            }
        }
        Message::SplitBlock => {
            let caret = model.caret.unwrap_or_else(|| model.document.end_caret());
            apply_edit(&mut model, "split-block", |doc| doc.split_block(caret));
        }
    }
    model
}

fn open_file(model: &mut Model, path: PathBuf, contents: &str) {
    if !is_markdown_path(&path) {
        tracing::warn!(path = %path.display(), "refusing to open non-markdown file");
        model.send(HostSignal::error(INVALID_FILE_MESSAGE));
        return;
    }
    match Document::parse(contents) {
        Ok(document) => {
            crate::perf::record(DebugEvent::FileOpened {
                path: &path,
                chars: document.char_count(),
            });
            model.install(document, Origin::File(path));
            model.send(HostSignal::EnableSave);
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to parse file");
            model.send(HostSignal::error(INVALID_FILE_MESSAGE));
        }
    }
}

/// Whether `path` has a `.md` or `.markdown` extension.
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
}

fn scroll_to(model: &mut Model, target: ScrollTarget) {
    let last_line = model.document.lines().len().saturating_sub(1);
    let line_position = |line: usize| f64::from(u32::try_from(line).unwrap_or(u32::MAX));
    let (caret, destination) = match target {
        ScrollTarget::Top => (Some(model.document.start_caret()), 0.0),
        ScrollTarget::Bottom => (Some(model.document.end_caret()), line_position(last_line)),
        ScrollTarget::Offset(line) => (None, line_position(line.min(last_line))),
    };
    model.scroll = Some(ScrollAnimation::new(
        model.scroll_top,
        destination,
        model.scroll_duration,
    ));
    if let Some(caret) = caret {
        model.caret = Some(caret);
        model.selection = None;
        model.refresh_current_line();
    }
}

// Wrap the selected range in the inline element for `format`. The caret
// lands at the end of the range.
fn format_selection(model: &mut Model, format: BlockFormat) {
    let Some(Selection { block, range }) = model.selection.take() else {
        return;
    };
    let selected: String = model
        .document
        .text_content(block)
        .chars()
        .skip(range.start)
        .take(range.len())
        .collect();
    let Some(kind) = format.inline_element(&selected) else {
        return;
    };
    // Marker spans would be split along with the range.
    let wrapped = crate::locator::clear_markers(&mut model.document)
        .and_then(|_| model.document.wrap_inline(block, range.clone(), kind));
    match wrapped {
        Ok(_) => model.caret = Some(model.document.caret_in(block, range.end)),
        Err(err) => discard_edit("format-to", &err),
    }
    model.refresh_current_line();
    model.refresh_map();
}

fn apply_edit(
    model: &mut Model,
    name: &str,
    edit: impl FnOnce(&mut Document) -> Result<Caret, TreeError>,
) {
    model.selection = None;
    match edit(&mut model.document) {
        Ok(caret) => {
            model.caret = Some(caret);
            model.document.reclaim_detached();
        }
        Err(err) => discard_edit(name, &err),
    }
}

fn discard_edit(name: &str, err: &TreeError) {
    tracing::warn!(edit = name, %err, "edit discarded");
    crate::perf::record(DebugEvent::EditFailed { edit: name, error: err });
}
