//! Session state and the host event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete session state
//! - [`Message`]: Host requests, input events and edits
//! - [`update`]: Pure function for state transitions
//! - [`Session::run`]: Event loop over the host channel

mod effects;
mod event_loop;
mod model;
mod update;

pub use effects::{HostSignal, decode_message, open_file_message, write_signals};
pub use model::{Model, Origin, Selection};
pub use update::{INVALID_FILE_MESSAGE, Message, ScrollTarget, is_markdown_path, update};

use std::path::PathBuf;
use std::time::Duration;

use crate::editor::DEFAULT_SCROLL_DURATION;
use crate::locator::{LineLocator, LocatorOptions};

/// Session configuration; owns nothing until [`Session::run`].
#[derive(Debug, Clone)]
pub struct Session {
    initial_file: Option<PathBuf>,
    locator_options: LocatorOptions,
    scroll_duration: Duration,
}

impl Session {
    pub fn new() -> Self {
        Self {
            initial_file: None,
            locator_options: LocatorOptions::default(),
            scroll_duration: DEFAULT_SCROLL_DURATION,
        }
    }

    /// Open this file before reading the host channel.
    #[must_use]
    pub fn with_initial_file(mut self, path: Option<PathBuf>) -> Self {
        self.initial_file = path;
        self
    }

    #[must_use]
    pub const fn with_locator_options(mut self, options: LocatorOptions) -> Self {
        self.locator_options = options;
        self
    }

    #[must_use]
    pub const fn with_scroll_duration(mut self, duration: Duration) -> Self {
        self.scroll_duration = duration;
        self
    }

    /// A fresh model configured for this session.
    pub fn model(&self) -> Model {
        Model::blank()
            .with_locator(LineLocator::new(self.locator_options))
            .with_scroll_duration(self.scroll_duration)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
