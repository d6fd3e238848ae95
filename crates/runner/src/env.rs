//! Typed concurrency knobs for kernel child processes.
//!
//! The harness itself never spawns worker threads; concurrency is configured
//! into the child via environment variables. A kernel may link more than one
//! numeric runtime, so the OpenMP and MKL counts are always set together.

use serde::{Deserialize, Serialize};

/// Thread counts handed to one child-process invocation.
///
/// An explicit value passed per spawn; the harness never mutates its own
/// ambient environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadConfig {
    /// `OMP_NUM_THREADS` for the child.
    pub omp_threads: u32,
    /// `MKL_NUM_THREADS` for the child.
    pub mkl_threads: u32,
}

impl ThreadConfig {
    pub fn new(omp_threads: u32, mkl_threads: u32) -> Self {
        Self {
            omp_threads,
            mkl_threads,
        }
    }

    /// Single-threaded baseline used for the first verification pass.
    pub fn serial() -> Self {
        Self::new(1, 1)
    }

    /// Environment variables to set on the child.
    pub fn vars(&self) -> [(&'static str, String); 2] {
        [
            ("OMP_NUM_THREADS", self.omp_threads.to_string()),
            ("MKL_NUM_THREADS", self.mkl_threads.to_string()),
        ]
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::serial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vars_set_both_runtimes() {
        let config = ThreadConfig::new(4, 24);
        let vars = config.vars();
        assert_eq!(vars[0], ("OMP_NUM_THREADS", "4".to_string()));
        assert_eq!(vars[1], ("MKL_NUM_THREADS", "24".to_string()));
    }

    #[test]
    fn test_default_is_serial() {
        assert_eq!(ThreadConfig::default(), ThreadConfig::new(1, 1));
    }
}
