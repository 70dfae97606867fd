//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from api-rpc crate.

use serde::{Deserialize, Serialize};

/// `returncode` value meaning "the runner, not the script, decided the
/// outcome" (timeout, launch failure, internal error, killed by signal).
/// Not an OS exit code; the reason is in `stderr`.
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Request to run a script
#[derive(Debug, Clone, Serialize)]
pub struct RunScriptRequest {
    pub script: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Response from run operation
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunScriptResponse {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl RunScriptResponse {
    pub fn success(&self) -> bool {
        self.returncode == 0
    }

    /// True when the daemon could not obtain a normal exit status
    pub fn is_sentinel(&self) -> bool {
        self.returncode == SENTINEL_EXIT_CODE
    }
}

/// Response from health operation
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
    pub sentinel_exit_code: i32,
}
