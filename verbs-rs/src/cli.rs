//! Command-line argument parsing.
//!
//! Usage:
//!   verbs [-c <cmd>]... [--config <file> | -f] [--blocking-wait] [-d] [<script>]

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "verbs", version)]
#[command(about = "Run line-oriented verb scripts")]
pub struct Cli {
    /// Script file to run (reads stdin when neither this nor -c is given)
    pub script: Option<PathBuf>,

    /// Run a command line before the script (repeatable)
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Load settings from this rc file instead of searching
    #[arg(long, value_name = "FILE", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Skip the rc file entirely
    #[arg(short = 'f', long)]
    pub no_config: bool,

    /// Make `wait` stall the whole runtime instead of suspending the pipeline
    #[arg(long)]
    pub blocking_wait: bool,

    /// Print the final $RESULT after the run
    #[arg(short = 'r', long)]
    pub print_result: bool,

    /// Debug logging (-d for debug, -dd for trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,
}

/// How to choose the rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Search `./.verbsrc`, then the platform config directory (default).
    Search,
    /// `-f`: skip the rc file.
    Skip,
    /// `--config <file>`: load this specific file.
    Explicit(PathBuf),
}

impl Cli {
    pub fn config_source(&self) -> ConfigSource {
        match (&self.config, self.no_config) {
            (_, true) => ConfigSource::Skip,
            (Some(path), false) => ConfigSource::Explicit(path.clone()),
            (None, false) => ConfigSource::Search,
        }
    }

    /// Log filter implied by `-d`, used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self.debug {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Locate the user rc file: `./.verbsrc`, then `<config dir>/verbsrc`.
pub fn find_user_config() -> Option<PathBuf> {
    let local = PathBuf::from(".verbsrc");
    let platform = ProjectDirs::from("", "", "verbs").map(|dirs| dirs.config_dir().join("verbsrc"));
    std::iter::once(local)
        .chain(platform)
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
