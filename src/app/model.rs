use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::HostSignal;
use crate::document::{Caret, Counts, Document, MapPointer, NodeId, counts, heading_map};
use crate::editor::{DEFAULT_SCROLL_DURATION, ModificationTracker, ScrollAnimation};
use crate::locator::{LineLocator, LocateOutcome};
use crate::perf::DebugEvent;

/// Where the current document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Nothing loaded and nothing typed yet.
    Blank,
    /// Untitled document that has received content.
    NewFile,
    /// Loaded from or saved to this path.
    File(PathBuf),
}

/// A selected character range of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub block: NodeId,
    pub range: Range<usize>,
}

/// The complete session state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug, Clone)]
pub struct Model {
    /// The editable document
    pub document: Document,
    /// Current caret, if the surface has a selection
    pub caret: Option<Caret>,
    /// Range picked with `select`, dropped on any other caret move or edit
    pub selection: Option<Selection>,
    pub origin: Origin,
    pub tracker: ModificationTracker,
    /// Status-bar counters
    pub counts: Counts,
    /// Heading map pointers
    pub map: Vec<MapPointer>,
    /// What the last recompute marked
    pub current_line: Option<LocateOutcome>,
    /// Scroll offset, in visible lines
    pub scroll_top: f64,
    /// Running scroll-to animation
    pub scroll: Option<ScrollAnimation>,
    pub(super) scroll_duration: Duration,
    pub(super) locator: LineLocator,
    outbox: Vec<HostSignal>,
}

impl Model {
    /// Create a session around `document`, taking its length as the baseline.
    pub fn new(document: Document, origin: Origin) -> Self {
        let baseline = document.char_count();
        let mut model = Self {
            document,
            caret: None,
            selection: None,
            origin,
            tracker: ModificationTracker::new(baseline),
            counts: Counts::default(),
            map: Vec::new(),
            current_line: None,
            scroll_top: 0.0,
            scroll: None,
            scroll_duration: DEFAULT_SCROLL_DURATION,
            locator: LineLocator::default(),
            outbox: Vec::new(),
        };
        model.refresh_counts();
        model.refresh_map();
        model
    }

    /// An empty, untitled session.
    pub fn blank() -> Self {
        Self::new(Document::empty(), Origin::Blank)
    }

    #[must_use]
    pub const fn with_locator(mut self, locator: LineLocator) -> Self {
        self.locator = locator;
        self
    }

    #[must_use]
    pub const fn with_scroll_duration(mut self, duration: Duration) -> Self {
        self.scroll_duration = duration;
        self
    }

    /// Path of the file backing the document.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            _ => None,
        }
    }

    pub const fn is_modified(&self) -> bool {
        self.tracker.is_modified()
    }

    /// Window title, with ` *` appended while modified.
    pub fn title(&self) -> String {
        let base = match &self.origin {
            Origin::Blank => "Andika".to_string(),
            Origin::NewFile => "Andika - New file".to_string(),
            Origin::File(path) => format!("Andika - {}", path.display()),
        };
        if self.is_modified() {
            format!("{base} *")
        } else {
            base
        }
    }

    /// Signals queued for the host since the last drain.
    pub fn pending_signals(&self) -> &[HostSignal] {
        &self.outbox
    }

    /// Drain queued signals in the order they were raised.
    pub fn take_signals(&mut self) -> Vec<HostSignal> {
        std::mem::take(&mut self.outbox)
    }

    pub(super) fn send(&mut self, signal: HostSignal) {
        tracing::debug!(?signal, "queue host signal");
        self.outbox.push(signal);
    }

    pub(super) fn refresh_counts(&mut self) {
        self.counts = counts(&self.document);
    }

    pub(super) fn refresh_map(&mut self) {
        self.map = heading_map(&self.document);
    }

    /// Recompute the modified state and tell the host when it changes.
    pub(super) fn refresh_modified(&mut self) {
        let change = if self.origin == Origin::NewFile {
            self.tracker.force_modified()
        } else {
            self.tracker.observe(self.document.char_count())
        };
        if let Some(modified) = change {
            self.send(HostSignal::HasBeenModified(modified));
        }
    }

    /// Capture the baseline after a load or save.
    pub(super) fn reset_baseline(&mut self) {
        if let Some(modified) = self.tracker.reset(self.document.char_count()) {
            self.send(HostSignal::HasBeenModified(modified));
        }
    }

    /// Recompute the current-line marker.
    ///
    /// Failures are logged and dropped; the session carries on.
    pub(super) fn refresh_current_line(&mut self) {
        match self.locator.locate(&mut self.document, self.caret) {
            Ok(Some(located)) => {
                self.caret = Some(located.caret);
                self.current_line = Some(located.outcome);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, caret = ?self.caret, "current line recompute discarded");
                crate::perf::record(DebugEvent::LocatorFailed { error: &err });
                self.current_line = None;
            }
        }
    }

    /// Replace the document, as on open or new file.
    pub(super) fn install(&mut self, document: Document, origin: Origin) {
        self.document = document;
        self.origin = origin;
        self.caret = None;
        self.selection = None;
        self.current_line = None;
        self.scroll = None;
        self.scroll_top = 0.0;
        self.reset_baseline();
        self.refresh_counts();
        self.refresh_map();
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::blank()
    }
}
