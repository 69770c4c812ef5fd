// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. locator::LineLocator)
    clippy::module_name_repetitions
)]

//! # Andika
//!
//! The core of a markdown editing surface.
//!
//! Andika keeps an editable document tree and, as the user types and
//! clicks, it:
//! - Tracks whether the buffer differs from what was last loaded or saved
//! - Highlights the current line, or the current sentence of a paragraph
//! - Maintains word/character counters and a map of level-2 headings
//!
//! ## Architecture
//!
//! Andika uses The Elm Architecture (TEA) pattern:
//! - **Model**: Session state
//! - **Message**: Host requests, input events and edits
//! - **Update**: Pure state transitions
//! - **Signals**: Effects for the host, sent as JSON lines
//!
//! ## Modules
//!
//! - [`app`]: Session state and the host event loop
//! - [`document`]: Markdown parsing, the node tree and edits
//! - [`editor`]: Modification tracking and scroll animation
//! - [`locator`]: Current line and sentence highlighting
//! - [`host`]: Save and close gating on the host side
//! - [`config`]: Saved command-line defaults

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod host;
pub mod locator;
pub mod perf;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{HostSignal, Message, Model, Session, update};
    pub use crate::document::{Caret, Document};
    pub use crate::host::HostState;
    pub use crate::locator::{LineLocator, LocatorOptions};
}
