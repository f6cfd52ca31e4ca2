//! # tidycsv command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Start logging into <output>/logs/tidycsv.log
//!   ├─> Load the rule set and build the RunConfig
//!   ├─> Validate, clean and report on every input file
//!   └─> Exit 1 if any file failed (or was invalid with --fail-on-invalid)
//! ```
//!
//! ```bash
//! tidycsv --input data.csv --output output/
//! tidycsv --input input/ --output output/ --fill-missing median --html
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // progress lines go to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    let log_dir = tidycsv::logging::init(&cli.output, cli.verbose)?;
    tracing::info!("tidycsv {} started", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Logging to {}", log_dir.display());

    let config = cli.into_config().inspect_err(|e| tracing::error!("{e:#}"))?;
    let status = cli::run(&config).inspect_err(|e| tracing::error!("{e:#}"))?;

    tracing::info!("tidycsv finished with status {status}");
    Ok(ExitCode::from(status))
}
