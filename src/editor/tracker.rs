/// Decides whether the buffer differs from what was last loaded or saved.
///
/// Only the character count of the visible text is compared, so edits that
/// keep the length (replacing one letter by another) go unnoticed, and
/// whitespace that changes the length counts as a modification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModificationTracker {
    /// Character count at the last load or save.
    baseline: usize,
    /// Last state reported to the host.
    reported: bool,
}

impl ModificationTracker {
    /// Create a tracker whose baseline is `len`.
    pub const fn new(len: usize) -> Self {
        Self {
            baseline: len,
            reported: false,
        }
    }

    /// The stored baseline.
    pub const fn baseline(&self) -> usize {
        self.baseline
    }

    /// Whether the last reported state was "modified".
    pub const fn is_modified(&self) -> bool {
        self.reported
    }

    /// Compare `len` against the baseline without touching any state.
    pub const fn has_been_modified(&self, len: usize) -> bool {
        len != self.baseline
    }

    /// Capture a new baseline after a load or a save.
    ///
    /// Returns `Some(false)` when the host had been told the document was
    /// modified and must now hear otherwise.
    pub fn reset(&mut self, len: usize) -> Option<bool> {
        self.baseline = len;
        self.report(false)
    }

    /// Recompute after an edit. Returns the new state only if it changed.
    pub fn observe(&mut self, len: usize) -> Option<bool> {
        self.report(self.has_been_modified(len))
    }

    /// Report the document as modified regardless of its length.
    ///
    /// Used for untitled documents, which have nothing on disk to match.
    pub fn force_modified(&mut self) -> Option<bool> {
        self.report(true)
    }

    fn report(&mut self, state: bool) -> Option<bool> {
        if state == self.reported {
            return None;
        }
        self.reported = state;
        Some(state)
    }
}
