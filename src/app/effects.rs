//! Side effects at the edge of the session: the host channel and file reads.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::Message;
use crate::perf::DebugEvent;

/// Signals sent from the surface to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum HostSignal {
    /// The surface is ready for messages.
    WindowLoaded,
    /// An untitled document received its first content.
    InitNewFile,
    /// The modified state changed.
    HasBeenModified(bool),
    /// A file was opened; saving is possible.
    EnableSave,
    /// Show a notification.
    Notify { text: String, error: bool },
    /// Write `markdown` to `path`, or ask for a path when there is none.
    Save {
        path: Option<PathBuf>,
        markdown: String,
    },
}

impl HostSignal {
    pub fn notify(text: impl Into<String>) -> Self {
        Self::Notify {
            text: text.into(),
            error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Notify {
            text: text.into(),
            error: true,
        }
    }
}

/// Write each signal as one JSON line and flush.
///
/// # Errors
/// Fails when serialisation or the write fails.
pub fn write_signals<W: Write>(out: &mut W, signals: &[HostSignal]) -> Result<()> {
    for signal in signals {
        serde_json::to_writer(&mut *out, signal).context("Failed to encode host signal")?;
        out.write_all(b"\n").context("Failed to write host signal")?;
    }
    out.flush().context("Failed to flush host channel")
}

/// Decode one line of the host channel.
///
/// # Errors
/// Fails when the line is not a known message.
pub fn decode_message(line: &str) -> Result<Message> {
    serde_json::from_str(line).with_context(|| format!("Invalid host message: {line}"))
}

/// Read a file from disk into an `OpenFile` message.
///
/// # Errors
/// Fails when the file cannot be read as UTF-8.
pub fn open_file_message(path: &Path) -> Result<Message> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    crate::perf::record(DebugEvent::FileRead {
        path,
        bytes: contents.len(),
    });
    Ok(Message::OpenFile {
        path: path.to_path_buf(),
        contents,
    })
}
