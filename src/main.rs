//! Andika - the core of a markdown editing surface.
//!
//! # Usage
//!
//! ```bash
//! andika stats notes.md
//! andika inspect notes.md --caret 14 --block 2
//! andika session notes.md < messages.jsonl
//! andika session --script messages.jsonl notes.md
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use andika::app::{HostSignal, Session};
use andika::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use andika::document::{Counts, Document, MapPointer, counts, heading_map};
use andika::editor::DEFAULT_SCROLL_DURATION;
use andika::host::{CloseDecision, HostState};
use andika::locator::{LineLocator, LocateOutcome};
use andika::perf;

/// Core of a markdown editing surface
#[derive(Parser, Debug)]
#[command(name = "andika", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Do not highlight the current line
    #[arg(long, global = true)]
    no_highlight: bool,

    /// Highlight whole paragraphs instead of the current sentence
    #[arg(long, global = true)]
    no_sentences: bool,

    /// Length of scroll-to-top/bottom animations in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    scroll_ms: Option<u64>,

    /// Enable performance logging
    #[arg(long, global = true)]
    perf: bool,

    /// Write debug events to a file
    #[arg(long, global = true, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print counters and the heading map of a markdown file
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Locate the current line for a caret and print the marked surface
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Character offset of the caret within the line
        #[arg(long)]
        caret: usize,
        /// Visible line the caret is on
        #[arg(long, default_value_t = 0)]
        block: usize,
    },
    /// Drive a session over JSON lines (stdin/stdout by default)
    Session {
        /// Read messages from this file instead of stdin
        #[arg(long, value_name = "PATH")]
        script: Option<PathBuf>,
        /// Markdown file to open first
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    counts: Counts,
    lines: usize,
    map: Vec<MapPointer>,
}

#[derive(Serialize)]
struct InspectReport {
    outcome: Option<LocateOutcome>,
    html: String,
}

fn main() -> Result<()> {
    // Initialize logging; stdout is the host channel.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("ANDIKA_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        tracing::warn!(
            path = %debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize debug log"
        );
    }

    match cli.command {
        Some(Command::Stats { file }) => stats(&file),
        Some(Command::Inspect { file, caret, block }) => inspect(&file, &effective, block, caret),
        Some(Command::Session { script, file }) => session(&effective, script.as_deref(), file),
        None if cli.save || cli.clear => Ok(()),
        None => session(&effective, None, None),
    }
}

fn read_document(file: &Path) -> Result<Document> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Document::parse(&source)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to encode report")?;
    writeln!(out).context("Failed to write report")
}

fn stats(file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    print_json(&StatsReport {
        counts: counts(&doc),
        lines: doc.lines().len(),
        map: heading_map(&doc),
    })
}

fn inspect(file: &Path, flags: &ConfigFlags, block: usize, offset: usize) -> Result<()> {
    let mut doc = read_document(file)?;
    let caret = doc
        .caret_at_line(block, offset)
        .with_context(|| format!("No line {block} in {}", file.display()))?;
    let located = LineLocator::new(flags.locator_options())
        .locate(&mut doc, Some(caret))
        .context("Failed to locate the current line")?;
    print_json(&InspectReport {
        outcome: located.map(|l| l.outcome),
        html: doc.to_html(),
    })
}

fn session(flags: &ConfigFlags, script: Option<&Path>, file: Option<PathBuf>) -> Result<()> {
    if let Some(missing) = file.as_ref().filter(|f| !f.exists()) {
        anyhow::bail!("File not found: {}", missing.display());
    }
    let session = Session::new()
        .with_initial_file(file)
        .with_locator_options(flags.locator_options())
        .with_scroll_duration(flags.scroll_duration().unwrap_or(DEFAULT_SCROLL_DURATION));

    let mut host = HostState::new();
    let mut output = io::stdout().lock();
    let observe = |signal: &HostSignal| host.apply(signal);
    let input: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let model = session
        .run_with_observer(input, &mut output, observe)
        .context("Session error")?;

    if script.is_some() {
        let decision = match host.request_close() {
            CloseDecision::Close => "close",
            CloseDecision::Confirm => "confirm",
        };
        eprintln!("{}: {decision}", model.title());
    }
    Ok(())
}
