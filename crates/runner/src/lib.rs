//! Child-process plumbing for the kernelcheck harness.
//!
//! Everything here is thin: invoking kernel binaries as blocking child
//! processes with typed thread-count environment variables, capturing their
//! streams under a deadline, and collecting repeated timing trials. All
//! decision logic lives in `kernelcheck-oracle`.

pub mod env;
pub mod exec;
pub mod trials;

pub use env::ThreadConfig;
pub use exec::{Capture, ProcessRunner, RunError};
pub use trials::run_trials;
