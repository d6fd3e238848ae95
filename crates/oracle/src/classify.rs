//! Stability classification for one (benchmark, candidate) pair.
//!
//! Correctness is checked independently at two concurrency settings: races in
//! a parallelized kernel are frequently invisible at low thread counts, so a
//! candidate that matches the reference single-threaded but diverges with
//! more workers is classified `unstable`, a distinct finding from `mismatch`.

use crate::compare::{compare, ComparePolicy, Verdict};
use crate::dump::{parse_dump, DumpError, NamedArraySet};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of one candidate variant on one benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    /// Verification or timing binary missing on disk.
    Unavailable,
    /// A capture could not be obtained or parsed.
    Corrupt,
    /// Baseline output differs from the reference beyond tolerance.
    Mismatch,
    /// Correct at baseline concurrency, diverges at elevated concurrency.
    Unstable,
    Good,
}

impl BenchmarkStatus {
    /// Only benchmarks reaching `good` or `unstable` are eligible for timing.
    pub fn timeable(self) -> bool {
        matches!(self, BenchmarkStatus::Good | BenchmarkStatus::Unstable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BenchmarkStatus::Unavailable => "unavailable",
            BenchmarkStatus::Corrupt => "corrupt",
            BenchmarkStatus::Mismatch => "mismatch",
            BenchmarkStatus::Unstable => "unstable",
            BenchmarkStatus::Good => "good",
        }
    }
}

impl fmt::Display for BenchmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concurrency setting a verification capture is requested under. The
/// classifier only distinguishes the two; mapping them onto concrete thread
/// counts is the invoker's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Single-threaded / default environment.
    Baseline,
    /// Elevated thread and worker counts.
    Perturbed,
}

/// The interface the classifier needs from the process collaborator that owns
/// a candidate's binaries.
pub trait VerifyTarget {
    /// Whether both the verification and the timing binary exist on disk.
    fn available(&self) -> bool;

    /// Invoke the verification binary under the given concurrency setting and
    /// return the raw diagnostic capture.
    fn capture(&mut self, mode: ConcurrencyMode) -> Result<String>;
}

/// Walk the status transition table for one candidate.
///
/// Inputs are consumed in a fixed order and the first matching transition
/// wins; in particular the perturbed capture is only requested once the
/// baseline comparison has passed. The reference capture is parsed once by
/// the caller and shared across candidates, since a corrupt reference blocks
/// every candidate of that benchmark.
pub fn classify(
    benchmark: &str,
    reference: &Result<NamedArraySet, DumpError>,
    candidate: &mut dyn VerifyTarget,
    policy: &ComparePolicy,
) -> BenchmarkStatus {
    if !candidate.available() {
        tracing::warn!(benchmark, "candidate binaries missing");
        return BenchmarkStatus::Unavailable;
    }

    let reference = match reference {
        Ok(arrays) => arrays,
        Err(err) => {
            tracing::warn!(benchmark, error = %err, "reference capture is corrupt");
            return BenchmarkStatus::Corrupt;
        }
    };

    let Some(baseline) = capture_arrays(benchmark, candidate, ConcurrencyMode::Baseline) else {
        return BenchmarkStatus::Corrupt;
    };
    match compare(reference, &baseline, policy) {
        Verdict::Equal => {}
        verdict => {
            tracing::warn!(benchmark, %verdict, "baseline output diverges from reference");
            return BenchmarkStatus::Mismatch;
        }
    }

    let Some(perturbed) = capture_arrays(benchmark, candidate, ConcurrencyMode::Perturbed) else {
        return BenchmarkStatus::Corrupt;
    };
    match compare(reference, &perturbed, policy) {
        Verdict::Equal => BenchmarkStatus::Good,
        verdict => {
            tracing::warn!(
                benchmark,
                %verdict,
                "output diverges under elevated concurrency"
            );
            BenchmarkStatus::Unstable
        }
    }
}

fn capture_arrays(
    benchmark: &str,
    candidate: &mut dyn VerifyTarget,
    mode: ConcurrencyMode,
) -> Option<NamedArraySet> {
    let raw = match candidate.capture(mode) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(benchmark, ?mode, error = %err, "candidate capture failed");
            return None;
        }
    };
    parse_dump(&raw)
        .map_err(|err| {
            tracing::warn!(benchmark, ?mode, error = %err, "candidate capture is corrupt");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::format_dump;

    fn set(entries: &[(&str, &[f64])]) -> NamedArraySet {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    /// In-memory stand-in for the kernel binaries, recording which captures
    /// were requested.
    struct FakeTarget {
        available: bool,
        baseline: Result<String, ()>,
        perturbed: Result<String, ()>,
        requested: Vec<ConcurrencyMode>,
    }

    impl FakeTarget {
        fn new(baseline: &NamedArraySet, perturbed: &NamedArraySet) -> Self {
            Self {
                available: true,
                baseline: Ok(format_dump(baseline)),
                perturbed: Ok(format_dump(perturbed)),
                requested: Vec::new(),
            }
        }
    }

    impl VerifyTarget for FakeTarget {
        fn available(&self) -> bool {
            self.available
        }

        fn capture(&mut self, mode: ConcurrencyMode) -> Result<String> {
            self.requested.push(mode);
            let capture = match mode {
                ConcurrencyMode::Baseline => &self.baseline,
                ConcurrencyMode::Perturbed => &self.perturbed,
            };
            capture
                .clone()
                .map_err(|_| anyhow::anyhow!("process exited abnormally"))
        }
    }

    fn policy() -> ComparePolicy {
        ComparePolicy::default()
    }

    #[test]
    fn test_good_when_both_settings_match() {
        let reference = set(&[("A", &[1.0, 2.0])]);
        let mut target = FakeTarget::new(&set(&[("A", &[1.005, 2.0])]), &reference);
        let status = classify("gemm", &Ok(reference.clone()), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Good);
        assert_eq!(
            target.requested,
            vec![ConcurrencyMode::Baseline, ConcurrencyMode::Perturbed]
        );
    }

    #[test]
    fn test_unavailable_short_circuits() {
        let reference = set(&[("A", &[1.0])]);
        let mut target = FakeTarget::new(&reference, &reference);
        target.available = false;
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Unavailable);
        assert!(target.requested.is_empty());
    }

    #[test]
    fn test_corrupt_reference_blocks_candidate() {
        let good = set(&[("A", &[1.0])]);
        let mut target = FakeTarget::new(&good, &good);
        let status = classify("gemm", &Err(DumpError::RegionNotFound), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Corrupt);
        assert!(target.requested.is_empty());
    }

    #[test]
    fn test_corrupt_baseline_capture() {
        let reference = set(&[("A", &[1.0])]);
        let mut target = FakeTarget::new(&reference, &reference);
        target.baseline = Ok("crashed before diagnostics".into());
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Corrupt);
    }

    #[test]
    fn test_capture_error_is_corrupt() {
        let reference = set(&[("A", &[1.0])]);
        let mut target = FakeTarget::new(&reference, &reference);
        target.baseline = Err(());
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Corrupt);
    }

    #[test]
    fn test_mismatch_wins_even_if_perturbed_would_match() {
        let reference = set(&[("A", &[1.0, 2.0])]);
        let mut target = FakeTarget::new(&set(&[("A", &[1.02, 2.0])]), &reference);
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Mismatch);
        // The perturbed capture is never requested after a baseline mismatch.
        assert_eq!(target.requested, vec![ConcurrencyMode::Baseline]);
    }

    #[test]
    fn test_unstable_when_only_perturbed_diverges() {
        let reference = set(&[("A", &[1.0, 2.0])]);
        let mut target = FakeTarget::new(&reference, &set(&[("A", &[1.0, 2.5])]));
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Unstable);
    }

    #[test]
    fn test_perturbed_key_set_change_is_unstable() {
        let reference = set(&[("A", &[1.0])]);
        let perturbed = set(&[("A", &[1.0]), ("B", &[0.0])]);
        let mut target = FakeTarget::new(&reference, &perturbed);
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Unstable);
    }

    #[test]
    fn test_corrupt_perturbed_capture() {
        let reference = set(&[("A", &[1.0])]);
        let mut target = FakeTarget::new(&reference, &reference);
        target.perturbed = Ok("no region".into());
        let status = classify("gemm", &Ok(reference), &mut target, &policy());
        assert_eq!(status, BenchmarkStatus::Corrupt);
    }

    #[test]
    fn test_timeable() {
        assert!(BenchmarkStatus::Good.timeable());
        assert!(BenchmarkStatus::Unstable.timeable());
        assert!(!BenchmarkStatus::Mismatch.timeable());
        assert!(!BenchmarkStatus::Corrupt.timeable());
        assert!(!BenchmarkStatus::Unavailable.timeable());
    }
}
