//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use cyborg_core::domain::ExecutionResult;
use serde::{Deserialize, Serialize};

/// script.run.v1 (alias: run) - Run a script
///
/// Accepts named params or positional `[script, args, timeout_ms]`.
#[derive(Debug, Deserialize)]
pub struct RunScriptRequest {
    pub script: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Overrides the daemon's default timeout for this call
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Result of script.run.v1
///
/// `returncode` is the process exit status, or `-1` when the runner decided
/// the outcome (timeout, launch failure, internal error, killed by signal).
/// `-1` is a convention of this API, not an OS exit code; `stderr` then
/// carries the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunScriptResponse {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl From<ExecutionResult> for RunScriptResponse {
    fn from(result: ExecutionResult) -> Self {
        Self {
            stdout: result.stdout,
            stderr: result.stderr,
            returncode: result.exit_code,
        }
    }
}

/// system.health.v1 - Liveness and effective settings
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
    pub sentinel_exit_code: i32,
}
