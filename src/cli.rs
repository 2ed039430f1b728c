//! Command-line interface definitions for shelf.
//!
//! Global options (verbosity, color, error format) sit on [`Cli`]; the work
//! happens in the `duplicates` subcommand.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates in the current directory
//! shelf duplicates
//!
//! # Recursive scan, keep the newest copy, move the rest aside
//! shelf duplicates ~/Downloads -s --spare newest -q
//!
//! # Numbered copies like "photo (1).jpg", removed after confirmation
//! shelf duplicates ~/Pictures -n -r
//!
//! # Machine-readable report
//! shelf duplicates ~/Downloads -s --output json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Find duplicate files and decide what happens to the spare copies.
///
/// Duplicates are found by content (size, then the first 1024 bytes, then
/// the full BLAKE3 hash) or by numbered filenames. One copy per group is
/// spared; the rest are reported, quarantined or removed.
#[derive(Debug, Parser)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print the final summary and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate files and apply a fate to the redundant copies
    #[command(visible_alias = "dups")]
    Duplicates(DuplicatesArgs),
}

/// Arguments for the duplicates subcommand.
#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    /// Directory to look for duplicates in
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Search subdirectories too
    #[arg(short, long)]
    pub search: bool,

    /// Detect numbered copies by filename instead of by content
    #[arg(short, long)]
    pub name: bool,

    /// Move redundant copies into the quarantine directory
    #[arg(short, long, conflicts_with = "remove")]
    pub quarantine: bool,

    /// Permanently delete redundant copies (asks for a confirmation word)
    #[arg(short, long)]
    pub remove: bool,

    /// Which copy to keep: oldest, newest, biggest, smallest, first, random
    ///
    /// Aliases old, new, big and small are accepted.
    #[arg(long, value_name = "POLICY")]
    pub spare: Option<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub output: Option<String>,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Name of the quarantine directory created under PATH
    #[arg(long, value_name = "NAME")]
    pub quarantine_dir: Option<String>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show progress bars while hashing
    #[arg(long)]
    pub progress: bool,
}
