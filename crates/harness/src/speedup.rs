//! Speedup statistics for one (benchmark, candidate) pair.

use kernelcheck_oracle::BenchmarkStatus;
use serde::Serialize;

/// Ratio of the reference mean time to a candidate statistic. NaN means
/// undefined (the candidate was not timed); never coerced to zero, which
/// would read as "infinitely slower".
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpeedupStats {
    /// reference mean / candidate mean.
    pub avg: f64,
    /// reference mean / fastest candidate run (upper bound on speedup).
    pub min: f64,
    /// reference mean / slowest candidate run (lower bound on speedup).
    pub max: f64,
}

impl SpeedupStats {
    pub fn undefined() -> Self {
        Self {
            avg: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.avg.is_nan()
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Combine reference and candidate samples into speedup statistics, gated on
/// the candidate's status.
pub fn speedup(status: BenchmarkStatus, reference: &[f64], candidate: &[f64]) -> SpeedupStats {
    if !status.timeable() || reference.is_empty() || candidate.is_empty() {
        return SpeedupStats::undefined();
    }
    let reference_mean = mean(reference);
    let fastest = candidate.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = candidate.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    SpeedupStats {
        avg: reference_mean / mean(candidate),
        min: reference_mean / fastest,
        max: reference_mean / slowest,
    }
}
