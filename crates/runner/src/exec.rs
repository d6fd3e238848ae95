//! Synchronous child-process invocation with output capture and a deadline.

use crate::env::ThreadConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Ways a child-process invocation can fail.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("executable does not exist: {0}")]
    ExecutableMissing(PathBuf),

    #[error("failed to spawn {exec}")]
    Spawn {
        exec: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while capturing output of {exec}")]
    Capture {
        exec: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{exec} did not finish within {limit:?}")]
    Timeout { exec: PathBuf, limit: Duration },

    #[error("{exec} wrote non-numeric timing output: {output:?}")]
    NonNumericOutput { exec: PathBuf, output: String },
}

/// Captured streams and exit status of one finished child.
#[derive(Debug)]
pub struct Capture {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// Runs kernel binaries as blocking child processes.
///
/// Each invocation is synchronous from the caller's point of view: the runner
/// waits for the child to exit (or hit the deadline) before returning, so
/// invocations never overlap.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Default per-invocation deadline. Kernel runs are expected to take
    /// seconds to minutes; a hung child must not block the harness forever.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    const POLL_INTERVAL: Duration = Duration::from_millis(20);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Invoke `exec` with the given thread configuration and capture both
    /// streams to completion.
    pub fn capture(&self, exec: &Path, threads: &ThreadConfig) -> Result<Capture, RunError> {
        if !exec.is_file() {
            return Err(RunError::ExecutableMissing(exec.to_path_buf()));
        }

        let mut child = Command::new(exec)
            .envs(threads.vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                exec: exec.to_path_buf(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child can never
        // deadlock on a full pipe buffer while we wait on it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait_with_deadline(&mut child, exec)?;
        let stdout = join_drained(stdout, exec)?;
        let stderr = join_drained(stderr, exec)?;

        tracing::debug!(
            exec = %exec.display(),
            omp = threads.omp_threads,
            mkl = threads.mkl_threads,
            code = status.code(),
            "child finished"
        );
        Ok(Capture {
            stdout,
            stderr,
            status,
        })
    }

    fn wait_with_deadline(&self, child: &mut Child, exec: &Path) -> Result<ExitStatus, RunError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let polled = child.try_wait().map_err(|source| RunError::Capture {
                exec: exec.to_path_buf(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                tracing::warn!(exec = %exec.display(), limit = ?self.timeout, "killing hung child");
                // Reap after the kill so the reader threads see EOF.
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Timeout {
                    exec: exec.to_path_buf(),
                    limit: self.timeout,
                });
            }
            thread::sleep(Self::POLL_INTERVAL);
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drained(
    handle: Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    exec: &Path,
) -> Result<String, RunError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .unwrap_or_else(|_| Ok(Vec::new()))
        .map_err(|source| RunError::Capture {
            exec: exec.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_captures_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let exec = script(dir.path(), "both", "echo out; echo err >&2");
        let runner = ProcessRunner::default();
        let capture = runner.capture(&exec, &ThreadConfig::serial()).unwrap();
        assert_eq!(capture.stdout.trim(), "out");
        assert_eq!(capture.stderr.trim(), "err");
        assert!(capture.status.success());
    }

    #[test]
    fn test_thread_vars_reach_child() {
        let dir = tempfile::tempdir().unwrap();
        let exec = script(dir.path(), "env", "echo $OMP_NUM_THREADS $MKL_NUM_THREADS");
        let runner = ProcessRunner::default();
        let capture = runner.capture(&exec, &ThreadConfig::new(4, 24)).unwrap();
        assert_eq!(capture.stdout.trim(), "4 24");
    }

    #[test]
    fn test_missing_executable() {
        let runner = ProcessRunner::default();
        let result = runner.capture(Path::new("/nonexistent/kernel"), &ThreadConfig::serial());
        assert!(matches!(result, Err(RunError::ExecutableMissing(_))));
    }

    #[test]
    fn test_hung_child_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let exec = script(dir.path(), "hang", "sleep 30");
        let runner = ProcessRunner::new(Duration::from_millis(200));
        let start = Instant::now();
        let result = runner.capture(&exec, &ThreadConfig::serial());
        assert!(matches!(result, Err(RunError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
