//! Orchestration for kernel benchmark verification and timing.
//!
//! Drives the `kernelcheck-oracle` classifier over the compiled binary tree
//! via `kernelcheck-runner`, persists one JSON record file per variant, and
//! renders speedup reports against the reference variant.
//!
//! # Key components
//!
//! - [`suite`]: the benchmark registry and binary-tree layout
//! - [`evaluate::Evaluator`]: per-benchmark classification plus timing
//! - [`record::ResultsFile`]: persisted per-variant records
//! - [`speedup`]/[`report`]: ratio statistics and the report table
//! - [`cli::run_cli`]: command-line entry point

pub mod cli;
pub mod evaluate;
pub mod record;
pub mod report;
pub mod speedup;
pub mod suite;

pub use evaluate::{EvalConfig, EvaluationOutcome, Evaluator};
pub use record::{results_path, BenchmarkRecord, ResultsFile};
pub use speedup::{speedup, SpeedupStats};
