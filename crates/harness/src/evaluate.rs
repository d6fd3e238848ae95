//! Per-benchmark evaluation: classification, then timing when eligible.

use crate::record::{BenchmarkRecord, ResultsFile};
use crate::suite::{BinLayout, REFERENCE_VARIANT};
use anyhow::Result;
use kernelcheck_oracle::dump::{parse_dump, DumpError, NamedArraySet};
use kernelcheck_oracle::{classify, ComparePolicy, ConcurrencyMode, VerifyTarget};
use kernelcheck_runner::{run_trials, ProcessRunner, ThreadConfig};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Root of the compiled binary tree.
    pub bin_root: PathBuf,
    /// Candidate variant directory under the binary root.
    pub variant: String,
    /// Timing repetitions per benchmark; 0 skips timing entirely.
    pub reps: usize,
    pub policy: ComparePolicy,
    /// Thread counts for the baseline verification pass.
    pub baseline: ThreadConfig,
    /// Elevated thread counts for the stability pass and for timing runs.
    pub perturbed: ThreadConfig,
    pub timeout: Duration,
}

impl EvalConfig {
    pub fn new(bin_root: impl Into<PathBuf>, variant: impl Into<String>) -> Self {
        Self {
            bin_root: bin_root.into(),
            variant: variant.into(),
            reps: 5,
            policy: ComparePolicy::default(),
            baseline: ThreadConfig::serial(),
            perturbed: ThreadConfig::new(4, 24),
            timeout: ProcessRunner::DEFAULT_TIMEOUT,
        }
    }
}

/// Everything one evaluation run produced. Owned by the caller; there is no
/// process-global results table.
#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    pub records: ResultsFile,
    /// Benchmarks that did not reach good/unstable, plus benchmarks whose
    /// timing aborted. Becomes the process exit code.
    pub failures: usize,
}

/// Candidate kernel binaries driven through the classifier seam.
struct KernelTarget<'a> {
    check_exec: PathBuf,
    run_exec: PathBuf,
    runner: &'a ProcessRunner,
    baseline: ThreadConfig,
    perturbed: ThreadConfig,
}

impl VerifyTarget for KernelTarget<'_> {
    fn available(&self) -> bool {
        self.check_exec.is_file() && self.run_exec.is_file()
    }

    fn capture(&mut self, mode: ConcurrencyMode) -> Result<String> {
        let threads = match mode {
            ConcurrencyMode::Baseline => self.baseline,
            ConcurrencyMode::Perturbed => self.perturbed,
        };
        // Diagnostics go to the error stream; stdout is not consulted here.
        let capture = self.runner.capture(&self.check_exec, &threads)?;
        Ok(capture.stderr)
    }
}

/// Evaluates one candidate variant across a set of benchmarks.
pub struct Evaluator {
    config: EvalConfig,
    layout: BinLayout,
    runner: ProcessRunner,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        let layout = BinLayout::new(&config.bin_root);
        let runner = ProcessRunner::new(config.timeout);
        Self {
            config,
            layout,
            runner,
        }
    }

    /// Evaluate every benchmark in order, reference before candidate and
    /// baseline before perturbed within each one.
    ///
    /// An unexpected fault inside a single evaluation is contained: it is
    /// logged, counted as a failure, and the run proceeds without losing the
    /// records already computed.
    pub fn evaluate(&self, benchmarks: &[&str]) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();
        for &benchmark in benchmarks {
            tracing::info!(benchmark, variant = %self.config.variant, "evaluating");
            match catch_unwind(AssertUnwindSafe(|| self.evaluate_one(benchmark))) {
                Ok((record, failed)) => {
                    tracing::info!(benchmark, status = %record.status, "evaluated");
                    outcome.records.insert(benchmark, record);
                    if failed {
                        outcome.failures += 1;
                    }
                }
                Err(_) => {
                    tracing::error!(benchmark, "internal fault during evaluation");
                    outcome.failures += 1;
                }
            }
        }
        outcome
    }

    /// Returns the record plus whether the benchmark counts as failed.
    fn evaluate_one(&self, benchmark: &str) -> (BenchmarkRecord, bool) {
        let reference = self.reference_arrays(benchmark);
        let mut target = KernelTarget {
            check_exec: self.layout.check_exec(&self.config.variant, benchmark),
            run_exec: self.layout.run_exec(&self.config.variant, benchmark),
            runner: &self.runner,
            baseline: self.config.baseline,
            perturbed: self.config.perturbed,
        };
        let status = classify(benchmark, &reference, &mut target, &self.config.policy);

        if !status.timeable() {
            return (BenchmarkRecord::untimed(status), true);
        }
        if self.config.reps == 0 {
            return (BenchmarkRecord::untimed(status), false);
        }

        // Timing always runs under the elevated thread counts.
        match run_trials(
            &self.runner,
            &target.run_exec,
            self.config.reps,
            &self.config.perturbed,
        ) {
            Ok(samples) => (BenchmarkRecord::timed(status, samples), false),
            Err(err) => {
                tracing::warn!(benchmark, error = %err, "timing aborted");
                (BenchmarkRecord::untimed(status), true)
            }
        }
    }

    /// Capture and parse the reference dump once per benchmark; a corrupt
    /// reference blocks every candidate.
    fn reference_arrays(&self, benchmark: &str) -> Result<NamedArraySet, DumpError> {
        let exec = self.layout.check_exec(REFERENCE_VARIANT, benchmark);
        let capture = match self.runner.capture(&exec, &self.config.baseline) {
            Ok(capture) => capture,
            Err(err) => {
                tracing::warn!(benchmark, error = %err, "reference capture failed");
                return Err(DumpError::RegionNotFound);
            }
        };
        parse_dump(&capture.stderr)
    }
}
