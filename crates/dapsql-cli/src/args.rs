//! Command-line argument definitions for the dapsql CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`].

use clap::Parser;

/// Command-line arguments for the dapsql configuration inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML dataset configuration
    #[arg(help = "Path to the configuration file")]
    pub input: String,

    /// Resolve every data binding and print its rows
    #[arg(short, long)]
    pub rows: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
