// Execution Domain Model

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{DomainError, Result};

/// Exit code reported when the runner, not the target process, decided the
/// outcome (timeout, launch failure, internal error, death by signal).
///
/// This is a wire convention, NOT an operating system exit status. Callers
/// must treat it as "no normal exit status was obtained" and read `stderr`
/// for the reason.
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Default wall-clock budget for a single run (3s)
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// A single script invocation: executable plus argument vector
///
/// Arguments are handed to the process as-is, one token each. They are never
/// joined into a shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    command: String,
    arguments: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(DomainError::EmptyCommand);
        }

        Ok(Self { command, arguments })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

/// Positive wall-clock budget for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeout(Duration);

impl ExecutionTimeout {
    pub fn from_millis(ms: u64) -> Result<Self> {
        if ms == 0 {
            return Err(DomainError::NonPositiveTimeout);
        }
        Ok(Self(Duration::from_millis(ms)))
    }

    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for ExecutionTimeout {
    fn default() -> Self {
        Self(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    /// Process exited on its own (any exit status)
    Completed,
    /// Timeout elapsed first; process was terminated
    TimedOut,
    /// Process could not be started
    LaunchFailed,
    /// Runner failed while supervising the process
    Internal,
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionOutcome::Completed => write!(f, "COMPLETED"),
            ExecutionOutcome::TimedOut => write!(f, "TIMED_OUT"),
            ExecutionOutcome::LaunchFailed => write!(f, "LAUNCH_FAILED"),
            ExecutionOutcome::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Normalized outcome of one run, produced exactly once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// Process exit status, or `SENTINEL_EXIT_CODE`
    pub exit_code: i32,
    pub outcome: ExecutionOutcome,
    pub duration_ms: i64,
}

impl ExecutionResult {
    /// Process ran to completion with an exit status
    pub fn completed(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            outcome: ExecutionOutcome::Completed,
            duration_ms: 0,
        }
    }

    /// Partial output is dropped on timeout
    pub fn timed_out(timeout: ExecutionTimeout) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Script timed out after {} ms", timeout.as_millis()),
            exit_code: SENTINEL_EXIT_CODE,
            outcome: ExecutionOutcome::TimedOut,
            duration_ms: 0,
        }
    }

    pub fn launch_failed(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: SENTINEL_EXIT_CODE,
            outcome: ExecutionOutcome::LaunchFailed,
            duration_ms: 0,
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: SENTINEL_EXIT_CODE,
            outcome: ExecutionOutcome::Internal,
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// True only for a completed run with exit status 0
    pub fn success(&self) -> bool {
        self.outcome == ExecutionOutcome::Completed && self.exit_code == 0
    }

    pub fn is_sentinel(&self) -> bool {
        self.exit_code == SENTINEL_EXIT_CODE
    }
}
