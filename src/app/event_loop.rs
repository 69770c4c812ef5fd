use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::app::{HostSignal, Model, Session, decode_message, open_file_message, update, write_signals};
use crate::perf::DebugEvent;

impl Session {
    /// Run the event loop until `input` is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial file cannot be read or the host
    /// channel fails. Malformed lines are logged and skipped.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<Model> {
        self.run_with_observer(input, output, |_| {})
    }

    /// Like [`Session::run`], also handing each outgoing signal to `observe`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::run`].
    pub fn run_with_observer<R, W, F>(&self, input: R, output: &mut W, mut observe: F) -> Result<Model>
    where
        R: BufRead,
        W: Write,
        F: FnMut(&HostSignal),
    {
        let _run_scope = crate::perf::scope("session.run");
        let mut model = self.model();
        emit(output, &[HostSignal::WindowLoaded], &mut observe)?;

        if let Some(path) = &self.initial_file {
            model = update(model, open_file_message(path)?);
            emit(output, &model.take_signals(), &mut observe)?;
        }

        let mut handled = 0usize;
        for (index, line) in input.lines().enumerate() {
            let line = line.context("Failed to read host channel")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg = match decode_message(line) {
                Ok(msg) => msg,
                Err(err) => {
                    tracing::warn!(line = index + 1, error = %err, "skipping host message");
                    crate::perf::record(DebugEvent::MessageSkipped {
                        line: index + 1,
                        error: &err,
                    });
                    continue;
                }
            };
            model = update(model, msg);
            emit(output, &model.take_signals(), &mut observe)?;
            handled += 1;
        }
        crate::perf::record(DebugEvent::SessionEnded { messages: handled });
        Ok(model)
    }
}

fn emit<W: Write>(
    output: &mut W,
    signals: &[HostSignal],
    observe: &mut impl FnMut(&HostSignal),
) -> Result<()> {
    signals.iter().for_each(&mut *observe);
    write_signals(output, signals)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run_lines(session: &Session, input: &str) -> (Model, Vec<HostSignal>, String) {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let model = session
            .run_with_observer(Cursor::new(input.to_string()), &mut out, |s| seen.push(s.clone()))
            .unwrap();
        (model, seen, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_window_loaded_is_sent_first() {
        let (_, seen, out) = run_lines(&Session::new(), "");
        assert_eq!(seen, vec![HostSignal::WindowLoaded]);
        assert_eq!(out, "{\"channel\":\"window-loaded\"}\n");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = "garbage\n\n{\"channel\":\"insert-text\",\"payload\":\"hi\"}\n{\"channel\":\"key-down\"}\n";
        let (model, seen, _) = run_lines(&Session::new(), input);
        assert_eq!(model.document.visible_text(), "hi");
        assert_eq!(seen, vec![HostSignal::WindowLoaded, HostSignal::InitNewFile]);
    }

    #[test]
    fn test_initial_file_is_opened_before_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.md");
        std::fs::write(&path, "Hello there.\n").unwrap();
        let session = Session::new().with_initial_file(Some(path.clone()));
        let (model, seen, _) = run_lines(&session, "");
        assert_eq!(model.path(), Some(path.as_path()));
        assert_eq!(seen.first(), Some(&HostSignal::WindowLoaded));
        assert!(seen.contains(&HostSignal::EnableSave));
    }

    #[test]
    fn test_missing_initial_file_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new().with_initial_file(Some(dir.path().join("gone.md")));
        let mut out = Vec::new();
        assert!(session.run(Cursor::new(String::new()), &mut out).is_err());
    }
}
