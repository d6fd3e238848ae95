//! CLI wiring for the kernelcheck harness.

use crate::evaluate::{EvalConfig, Evaluator};
use crate::record::{results_path, ResultsFile};
use crate::report::{build_report, render_table};
use crate::suite::{resolve, REFERENCE_VARIANT};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kernelcheck_oracle::ComparePolicy;
use kernelcheck_runner::ThreadConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kernelcheck", about = "Kernel correctness verification and speedup measurement")]
pub struct Cli {
    /// Root of the compiled benchmark binary tree.
    #[arg(long, default_value = "bin")]
    pub bin_root: PathBuf,

    /// Directory holding per-variant result records.
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Absolute tolerance for output comparison.
    #[arg(long, default_value_t = ComparePolicy::default().abs_epsilon)]
    pub epsilon: f64,

    /// Require bit-exact equality (overrides --epsilon).
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// OpenMP thread count for the perturbed verification pass and timing.
    #[arg(long, default_value_t = 4)]
    pub omp_threads: u32,

    /// MKL thread count for the perturbed verification pass and timing.
    #[arg(long, default_value_t = 24)]
    pub mkl_threads: u32,

    /// Per-invocation deadline for kernel child processes.
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,
}

impl VerifyArgs {
    fn policy(&self) -> ComparePolicy {
        if self.strict {
            ComparePolicy::strict()
        } else {
            ComparePolicy::absolute(self.epsilon)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a candidate variant against the reference, without timing.
    Check {
        /// Candidate variant directory under the binary root.
        #[arg(long, default_value = "optimized_c")]
        variant: String,

        /// Benchmark names; `all` and `important` select curated sets.
        #[arg(required = true)]
        benchmarks: Vec<String>,

        #[command(flatten)]
        verify: VerifyArgs,
    },
    /// Classify, time and persist result records for a variant.
    Bench {
        /// Candidate variant directory under the binary root.
        variant: String,

        /// Benchmark names; defaults to the full suite.
        #[arg(default_value = "all")]
        benchmarks: Vec<String>,

        /// Timing repetitions per benchmark.
        #[arg(long, default_value_t = 5)]
        reps: usize,

        #[command(flatten)]
        verify: VerifyArgs,
    },
    /// Print the speedup table for a previously benched variant.
    Report {
        /// Variant whose records to compare against the reference records.
        variant: String,
    },
}

/// Run the parsed CLI and return the failure count for the process exit code.
pub fn run_cli(cli: Cli) -> Result<usize> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::Check {
            variant,
            benchmarks,
            verify,
        } => {
            let benchmarks = resolve(&benchmarks)?;
            let evaluator = Evaluator::new(eval_config(&cli.bin_root, &variant, 0, &verify));
            let outcome = evaluator.evaluate(&benchmarks);
            for (benchmark, record) in outcome.records.iter() {
                println!("{benchmark}: {}", record.status);
            }
            Ok(outcome.failures)
        }
        Command::Bench {
            variant,
            benchmarks,
            reps,
            verify,
        } => {
            let benchmarks = resolve(&benchmarks)?;
            let evaluator = Evaluator::new(eval_config(&cli.bin_root, &variant, reps, &verify));
            let outcome = evaluator.evaluate(&benchmarks);

            let path = results_path(&cli.results_dir, &variant);
            outcome
                .records
                .save(&path)
                .with_context(|| format!("saving results for `{variant}`"))?;
            info!(
                variant = %variant,
                benchmarks = outcome.records.len(),
                failures = outcome.failures,
                path = %path.display(),
                "evaluation complete"
            );
            Ok(outcome.failures)
        }
        Command::Report { variant } => {
            let reference =
                ResultsFile::load(results_path(&cli.results_dir, REFERENCE_VARIANT))
                    .context("loading reference results")?;
            let candidate = ResultsFile::load(results_path(&cli.results_dir, &variant))
                .with_context(|| format!("loading results for `{variant}`"))?;
            let rows = build_report(&reference, &candidate);
            print!("{}", render_table(&rows));
            Ok(0)
        }
    }
}

fn eval_config(bin_root: &Path, variant: &str, reps: usize, verify: &VerifyArgs) -> EvalConfig {
    let mut config = EvalConfig::new(bin_root, variant);
    config.reps = reps;
    config.policy = verify.policy();
    config.baseline = ThreadConfig::serial();
    config.perturbed = ThreadConfig::new(verify.omp_threads, verify.mkl_threads);
    config.timeout = Duration::from_secs(verify.timeout_secs);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_strict_overrides_epsilon() {
        let cli = Cli::parse_from(["kernelcheck", "check", "--strict", "gemm"]);
        let Command::Check { verify, .. } = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(verify.policy().abs_epsilon, 0.0);
    }

    #[test]
    fn test_bench_defaults() {
        let cli = Cli::parse_from(["kernelcheck", "bench", "opt_mkl"]);
        let Command::Bench {
            variant,
            benchmarks,
            reps,
            verify,
        } = cli.command
        else {
            panic!("expected bench command");
        };
        assert_eq!(variant, "opt_mkl");
        assert_eq!(benchmarks, vec!["all".to_string()]);
        assert_eq!(reps, 5);
        assert_eq!(verify.policy().abs_epsilon, 0.011);
    }
}
