//! Saved command-line defaults.
//!
//! Config files hold plain command-line flags, any number per line, with
//! `#` starting a comment line. The global file is combined with a local
//! `.andikarc` and the flags actually passed on the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::locator::LocatorOptions;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_highlight: bool,
    pub no_sentences: bool,
    pub perf: bool,
    pub scroll_ms: Option<u64>,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Combine two flag sets; switches add up and `other` wins for values.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_highlight: self.no_highlight || other.no_highlight,
            no_sentences: self.no_sentences || other.no_sentences,
            perf: self.perf || other.perf,
            scroll_ms: other.scroll_ms.or(self.scroll_ms),
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    pub const fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            enabled: !self.no_highlight,
            sentences: !self.no_sentences,
        }
    }

    /// Scroll animation length, if one was configured.
    pub fn scroll_duration(&self) -> Option<Duration> {
        self.scroll_ms.map(Duration::from_millis)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("andika").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("andika")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("andika").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("andika").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".andikarc")
}

/// Read a flag file. A missing file yields the defaults.
///
/// # Errors
/// Fails when the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as a flag file, creating parent directories.
///
/// # Errors
/// Fails when the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# andika defaults (saved with --save)".to_string()];
    if flags.no_highlight {
        lines.push("--no-highlight".to_string());
    }
    if flags.no_sentences {
        lines.push("--no-sentences".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(ms) = flags.scroll_ms {
        lines.push(format!("--scroll-ms {ms}"));
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a flag file if present.
///
/// # Errors
/// Fails when the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; everything else is ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--no-highlight" {
            flags.no_highlight = true;
        } else if token == "--no-sentences" {
            flags.no_sentences = true;
        } else if token == "--perf" {
            flags.perf = true;
        } else if token == "--scroll-ms" {
            if let Some(next) = tokens.get(i + 1) {
                flags.scroll_ms = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--scroll-ms=") {
            flags.scroll_ms = value.parse().ok();
        } else if token == "--debug-log" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debug_log = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debug-log=") {
            flags.debug_log = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}
