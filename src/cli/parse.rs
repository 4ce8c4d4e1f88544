//! CLI parse: clap types for papestash. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Papestash CLI - cached access to a wallpaper catalogue
#[derive(Parser)]
#[command(name = "papestash")]
#[command(about = "Browse a wallpaper catalogue through a deduplicating query cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read wallpapers from a JSON file instead of the HTTP service
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List wallpapers, optionally filtered
    List {
        /// Aspect ratio label (16:9, 9:16, 21:9, 4:3, 3:4, 1:1)
        #[arg(long)]
        aspect_ratio: Option<String>,
        /// Minimum file size in bytes (requires --max-size)
        #[arg(long)]
        min_size: Option<u64>,
        /// Maximum file size in bytes (requires --min-size)
        #[arg(long)]
        max_size: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one wallpaper by id
    Show {
        id: i64,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Poll the catalogue, printing a line per state change
    Watch {
        /// Seconds between invalidations
        #[arg(long, default_value = "30")]
        interval_secs: u64,
        /// Stop after this many refreshes (default: run until interrupted)
        #[arg(long)]
        count: Option<u32>,
    },
    /// Print the effective configuration as TOML
    Config,
}
