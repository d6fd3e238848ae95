//! Verification oracle for compiled numerical-kernel benchmarks.
//!
//! Decides whether an optimized kernel variant produces the same output as a
//! trusted reference implementation, at two concurrency settings, under a
//! numeric tolerance. This crate is pure decision logic: it consumes raw
//! diagnostic text and produces classifications, and never touches processes
//! or the filesystem itself.
//!
//! # Key components
//!
//! - [`dump::parse_dump`]: reconstructs named arrays from a diagnostic capture
//! - [`compare::compare`]: tolerance comparison of two array sets
//! - [`classify::classify`]: the five-state stability classifier
//! - [`classify::VerifyTarget`]: the seam to the process collaborator

pub mod classify;
pub mod compare;
pub mod dump;

pub use classify::{classify, BenchmarkStatus, ConcurrencyMode, VerifyTarget};
pub use compare::{compare, ComparePolicy, Verdict};
pub use dump::{format_dump, parse_dump, DumpError, NamedArraySet};
