//! Command-line interface for shortsmith
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use uuid::Uuid;

/// Short-form video generation pipeline
#[derive(Parser, Debug)]
#[command(
    name = "shortsmith",
    version,
    about = "Turn a topic into a finished short-form video"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: progress detail, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a target duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `1m`), and compound (`1m30s`).
pub fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a short locally, waiting for the result
    Create {
        /// Topic or idea for the short
        topic: String,

        /// Target duration (default: 30s). Examples: 30, 45s, 1m
        #[arg(long, value_name = "DURATION", default_value = "30s", value_parser = parse_duration_secs)]
        duration: u64,

        /// Disable caption overlay
        #[arg(long)]
        no_captions: bool,

        /// Provider voice id (default: auto-select)
        #[arg(long, value_name = "VOICE")]
        voice: Option<String>,

        /// Output directory override
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Start the daemon (foreground process for systemd)
    Daemon {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Submit a job to the daemon via IPC
    Submit {
        /// Topic or idea for the short
        topic: String,

        /// Target duration (default: 30s). Examples: 30, 45s, 1m
        #[arg(long, value_name = "DURATION", default_value = "30s", value_parser = parse_duration_secs)]
        duration: u64,

        /// Disable caption overlay
        #[arg(long)]
        no_captions: bool,

        /// Provider voice id (default: auto-select)
        #[arg(long, value_name = "VOICE")]
        voice: Option<String>,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Get one job's status via IPC
    Status {
        /// Job id returned by submit
        id: Uuid,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// List all jobs via IPC, newest first
    List {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Print the final artifact path of a completed job via IPC
    Fetch {
        /// Job id returned by submit
        id: Uuid,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Cancel a running job via IPC
    Cancel {
        /// Job id returned by submit
        id: Uuid,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/shortsmith.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Check system dependencies and credentials
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
