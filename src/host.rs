//! Host-side consumer of the session's signals.
//!
//! Tracks whether saving is possible and whether closing the window must
//! be confirmed first.

use crate::app::HostSignal;

/// Question asked before closing a modified document.
pub const CONFIRM_CLOSE_MESSAGE: &str = "Are you sure you want to quit?";

/// Buttons of the close confirmation, in display order.
pub const CLOSE_BUTTONS: [&str; 3] = ["Save & Quit", "Cancel", "Quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Close,
    /// Ask the user with [`CLOSE_BUTTONS`].
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseChoice {
    SaveAndQuit,
    Cancel,
    Quit,
}

impl CloseChoice {
    /// Map a button index of [`CLOSE_BUTTONS`].
    pub const fn from_button(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::SaveAndQuit),
            1 => Some(Self::Cancel),
            2 => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseResolution {
    /// Save first, then close once the save went through.
    SaveThenClose,
    Stay,
    Close,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostState {
    pub save_enabled: bool,
    pub confirm_to_close: bool,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from one signal; signals without host state are ignored.
    pub fn apply(&mut self, signal: &HostSignal) {
        match signal {
            HostSignal::EnableSave | HostSignal::InitNewFile => self.save_enabled = true,
            HostSignal::HasBeenModified(modified) => self.confirm_to_close = *modified,
            HostSignal::WindowLoaded | HostSignal::Notify { .. } | HostSignal::Save { .. } => {}
        }
    }

    pub const fn request_close(&self) -> CloseDecision {
        if self.confirm_to_close {
            CloseDecision::Confirm
        } else {
            CloseDecision::Close
        }
    }

    /// Act on the answer to the close confirmation.
    pub fn resolve_close(&mut self, choice: CloseChoice) -> CloseResolution {
        match choice {
            CloseChoice::SaveAndQuit => CloseResolution::SaveThenClose,
            CloseChoice::Cancel => CloseResolution::Stay,
            CloseChoice::Quit => {
                self.confirm_to_close = false;
                CloseResolution::Close
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_host_closes_without_asking() {
        let host = HostState::new();
        assert!(!host.save_enabled);
        assert_eq!(host.request_close(), CloseDecision::Close);
    }

    #[test]
    fn test_save_enabled_by_open_or_new_file() {
        let mut host = HostState::new();
        host.apply(&HostSignal::InitNewFile);
        assert!(host.save_enabled);

        let mut host = HostState::new();
        host.apply(&HostSignal::EnableSave);
        assert!(host.save_enabled);
    }

    #[test]
    fn test_modified_signal_gates_close() {
        let mut host = HostState::new();
        host.apply(&HostSignal::HasBeenModified(true));
        assert_eq!(host.request_close(), CloseDecision::Confirm);
        host.apply(&HostSignal::HasBeenModified(false));
        assert_eq!(host.request_close(), CloseDecision::Close);
    }

    #[test]
    fn test_notifications_leave_state_alone() {
        let mut host = HostState::new();
        host.apply(&HostSignal::notify("File saved"));
        host.apply(&HostSignal::WindowLoaded);
        assert_eq!(host, HostState::default());
    }

    #[test]
    fn test_resolve_close_choices() {
        let mut host = HostState::new();
        host.apply(&HostSignal::HasBeenModified(true));

        assert_eq!(host.resolve_close(CloseChoice::Cancel), CloseResolution::Stay);
        assert_eq!(host.request_close(), CloseDecision::Confirm);

        assert_eq!(
            host.resolve_close(CloseChoice::SaveAndQuit),
            CloseResolution::SaveThenClose
        );
        assert_eq!(host.request_close(), CloseDecision::Confirm);

        assert_eq!(host.resolve_close(CloseChoice::Quit), CloseResolution::Close);
        assert_eq!(host.request_close(), CloseDecision::Close);
    }

    #[test]
    fn test_choice_from_button_index() {
        let choices: Vec<_> = (0..CLOSE_BUTTONS.len())
            .map(CloseChoice::from_button)
            .collect();
        assert_eq!(
            choices,
            vec![
                Some(CloseChoice::SaveAndQuit),
                Some(CloseChoice::Cancel),
                Some(CloseChoice::Quit)
            ]
        );
        assert_eq!(CloseChoice::from_button(3), None);
    }
}
