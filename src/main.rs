//! # Medallion command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Initialize logging (console + rolling files)
//!   ├─> Parse CLI arguments (clap)
//!   └─> Run the command; exit code 1 if the run did not succeed
//! ```
//!
//! ```bash
//! medallion run --source-dir extracts --output gold --format parquet
//! medallion check --as-of 2025-01-01
//! medallion verify gold/dim_customers/<version>.meta.json
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    if let Err(e) = medallion::logging::init() {
        // Console-only fallback when the log directory is unavailable
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .try_init();
        tracing::warn!("File logging disabled: {e:#}");
    }

    let cli = cli::Cli::parse();

    let Some(command) = cli.command else {
        cli::Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    if cli::run_command(command)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
