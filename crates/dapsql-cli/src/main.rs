//! dapsql CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use dapsql_cli::Args;

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    // Logs go to stderr so the report on stdout stays clean.
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting dapsql");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = dapsql_cli::run(&args) {
        error!(err:err; "Run failed");
        eprintln!("error: {err}");
        process::exit(1);
    }

    info!("Completed successfully");
}
