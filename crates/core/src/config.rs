// Runner configuration (environment-driven, validated at startup)

use crate::domain::{ExecutionTimeout, DEFAULT_TIMEOUT_MS};
use crate::error::{AppError, Result};
use std::str::FromStr;

/// Upper bound for any per-call timeout override (10 minutes)
pub const DEFAULT_MAX_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Grace period between SIGTERM and SIGKILL on timeout (0 = kill immediately)
pub const DEFAULT_KILL_GRACE_MS: u64 = 0;

/// Maximum number of child processes running at once
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 64;

pub const ENV_TIMEOUT_MS: &str = "CYBORG_TIMEOUT_MS";
pub const ENV_MAX_TIMEOUT_MS: &str = "CYBORG_MAX_TIMEOUT_MS";
pub const ENV_KILL_GRACE_MS: &str = "CYBORG_KILL_GRACE_MS";
pub const ENV_MAX_CONCURRENT: &str = "CYBORG_MAX_CONCURRENT";

/// Script runner settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Timeout used when a call does not carry its own `timeout_ms`
    pub default_timeout_ms: u64,
    /// Per-call overrides above this are rejected
    pub max_timeout_ms: u64,
    pub kill_grace_ms: u64,
    pub max_concurrent_runs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: DEFAULT_MAX_TIMEOUT_MS,
            kill_grace_ms: DEFAULT_KILL_GRACE_MS,
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
        }
    }
}

impl RunnerConfig {
    /// Load from `CYBORG_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (testable form of `from_env`)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            default_timeout_ms: parse_var(&lookup, ENV_TIMEOUT_MS)?
                .unwrap_or(defaults.default_timeout_ms),
            max_timeout_ms: parse_var(&lookup, ENV_MAX_TIMEOUT_MS)?
                .unwrap_or(defaults.max_timeout_ms),
            kill_grace_ms: parse_var(&lookup, ENV_KILL_GRACE_MS)?
                .unwrap_or(defaults.kill_grace_ms),
            max_concurrent_runs: parse_var(&lookup, ENV_MAX_CONCURRENT)?
                .unwrap_or(defaults.max_concurrent_runs),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_ms == 0 {
            return Err(AppError::Config(format!(
                "{} must be positive",
                ENV_TIMEOUT_MS
            )));
        }
        if self.default_timeout_ms > self.max_timeout_ms {
            return Err(AppError::Config(format!(
                "default timeout {}ms exceeds max timeout {}ms",
                self.default_timeout_ms, self.max_timeout_ms
            )));
        }
        if self.max_concurrent_runs == 0 {
            return Err(AppError::Config(format!(
                "{} must be at least 1",
                ENV_MAX_CONCURRENT
            )));
        }
        Ok(())
    }

    /// Pick the timeout for one call: override if present, global default otherwise
    pub fn resolve_timeout(&self, override_ms: Option<u64>) -> Result<ExecutionTimeout> {
        let ms = override_ms.unwrap_or(self.default_timeout_ms);
        if ms > self.max_timeout_ms {
            return Err(AppError::Validation(format!(
                "timeout_ms {} exceeds maximum of {}",
                ms, self.max_timeout_ms
            )));
        }
        Ok(ExecutionTimeout::from_millis(ms)?)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("invalid {}={:?}: {}", key, raw, e))),
    }
}
