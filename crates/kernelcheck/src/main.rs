//! Harness executable for kernelcheck.

use clap::Parser;
use kernelcheck_harness::cli::{run_cli, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_cli(cli) {
        // Exit code = number of failed benchmarks, saturated to stay within
        // the platform exit-status range.
        Ok(failures) => ExitCode::from(failures.min(101) as u8),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
