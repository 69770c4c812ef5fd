//! Session-level helpers for the editing surface.
//!
//! Provides the length-based modification tracker and the scroll
//! animation used by scroll-to-top/bottom.

mod scroll;
mod tracker;

pub use scroll::{DEFAULT_SCROLL_DURATION, ScrollAnimation};
pub use tracker::ModificationTracker;
