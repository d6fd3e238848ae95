//! Repeated timing trials for one benchmark binary.

use crate::env::ThreadConfig;
use crate::exec::{ProcessRunner, RunError};
use std::path::Path;

/// Run `exec` for `reps` timed trials and collect the raw samples in
/// invocation order.
///
/// A timing binary writes exactly one floating-point number (elapsed seconds)
/// to stdout. A single capture that does not parse as a finite, non-negative
/// number aborts the remaining repetitions; no partial sample is returned.
/// Every trial counts: no warm-up discard, no outlier rejection.
pub fn run_trials(
    runner: &ProcessRunner,
    exec: &Path,
    reps: usize,
    threads: &ThreadConfig,
) -> Result<Vec<f64>, RunError> {
    let mut samples = Vec::with_capacity(reps);
    for rep in 1..=reps {
        let capture = runner.capture(exec, threads)?;
        let text = capture.stdout.trim();
        let seconds = match text.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value,
            _ => {
                return Err(RunError::NonNumericOutput {
                    exec: exec.to_path_buf(),
                    output: text.chars().take(80).collect(),
                });
            }
        };
        tracing::debug!(exec = %exec.display(), rep, reps, seconds, "trial complete");
        samples.push(seconds);
    }
    Ok(samples)
}
