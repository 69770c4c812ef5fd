//! Lightweight performance instrumentation.
//!
//! Two independent sinks: scoped timings printed to stderr when `--perf` is
//! set, and a debug log of session events written to the `--debug-log` file.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: Mutex<Option<DebugLog>> = Mutex::new(None);

/// Timer that reports its lifetime on drop.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Start timing `name` until the returned guard drops.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Something worth a line in the debug log.
///
/// Events borrow their details, so nothing is formatted unless the log is on.
#[derive(Clone, Copy)]
pub enum DebugEvent<'a> {
    DocumentParsed { bytes: usize, nodes: usize },
    FileRead { path: &'a Path, bytes: usize },
    FileOpened { path: &'a Path, chars: usize },
    LineLocated { outcome: &'a dyn fmt::Debug, cleared: usize },
    LocatorFailed { error: &'a dyn fmt::Display },
    EditFailed { edit: &'a str, error: &'a dyn fmt::Display },
    MessageSkipped { line: usize, error: &'a dyn fmt::Display },
    SessionEnded { messages: usize },
}

impl DebugEvent<'_> {
    /// Dotted name that leads the log line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DocumentParsed { .. } => "document.parse",
            Self::FileRead { .. } => "file.read",
            Self::FileOpened { .. } => "file.open",
            Self::LineLocated { .. } => "locator.mark",
            Self::LocatorFailed { .. } => "locator.failed",
            Self::EditFailed { .. } => "edit.failed",
            Self::MessageSkipped { .. } => "bridge.skip",
            Self::SessionEnded { .. } => "session.end",
        }
    }
}

impl fmt::Display for DebugEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name())?;
        match self {
            Self::DocumentParsed { bytes, nodes } => write!(f, "bytes={bytes} nodes={nodes}"),
            Self::FileRead { path, bytes } => write!(f, "path={} bytes={bytes}", path.display()),
            Self::FileOpened { path, chars } => {
                write!(f, "path={} chars={chars}", path.display())
            }
            Self::LineLocated { outcome, cleared } => write!(f, "cleared={cleared} {outcome:?}"),
            Self::LocatorFailed { error } => write!(f, "{error}"),
            Self::EditFailed { edit, error } => write!(f, "{edit}: {error}"),
            Self::MessageSkipped { line, error } => write!(f, "line={line} err={error}"),
            Self::SessionEnded { messages } => write!(f, "messages={messages}"),
        }
    }
}

impl fmt::Debug for DebugEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

struct DebugLog {
    start: Instant,
    writer: BufWriter<File>,
}

// A panic while logging must not silence the log for the rest of the session.
fn debug_log() -> MutexGuard<'static, Option<DebugLog>> {
    DEBUG_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Route [`record`] to `path`, truncating it. `None` turns the log off.
///
/// # Errors
/// Fails when the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = debug_log();
    *log = None;
    if let Some(path) = path {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "andika debug log start")?;
        writer.flush()?;
        *log = Some(DebugLog {
            start: Instant::now(),
            writer,
        });
    }
    Ok(())
}

/// Append one timestamped event to the debug log, if it is on.
pub fn record(event: DebugEvent<'_>) {
    let mut log = debug_log();
    let Some(log) = log.as_mut() else { return };
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    let _ = writeln!(log.writer, "[{elapsed_ms:>10.3} ms] {event}");
    let _ = log.writer.flush();
}
