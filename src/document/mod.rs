//! The document buffer behind the editing surface.
//!
//! This module handles:
//! - Parsing markdown with comrak into an arena tree
//! - Caret resolution and text edits on that tree
//! - Serialising back to Markdown and HTML
//! - Counters and the heading map

mod edit;
mod parser;
mod render;
mod stats;
mod types;

pub use edit::BlockFormat;
pub use parser::parse;
pub use stats::{Counts, MapPointer, counts, heading_map};
pub use types::{
    CURRENT_POSITION_CLASS, Caret, ColumnAlign, Document, ElementKind, Node, NodeId, NodeKind,
    TreeError,
};
