// Run Script Use Case
// Validates a raw call, resolves its timeout, bounds concurrency, delegates to the runner

use crate::config::RunnerConfig;
use crate::domain::{ExecutionRequest, ExecutionResult};
use crate::error::{AppError, Result};
use crate::port::ScriptRunner;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Script execution service
///
/// Caller mistakes (empty command, bad timeout) are `AppError::Domain` or
/// `AppError::Validation`.
/// Anything that happens once the request is valid is an `ExecutionResult`.
pub struct RunScriptService {
    runner: Arc<dyn ScriptRunner>,
    config: RunnerConfig,
    permits: Arc<Semaphore>,
}

impl RunScriptService {
    pub fn new(runner: Arc<dyn ScriptRunner>, config: RunnerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));
        Self {
            runner,
            config,
            permits,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `command` with `arguments`
    ///
    /// `timeout_ms` overrides the configured default for this call only.
    /// Calls beyond `max_concurrent_runs` wait for a free slot; the timeout
    /// clock starts once the process is launched.
    pub async fn run(
        &self,
        command: impl Into<String>,
        arguments: Vec<String>,
        timeout_ms: Option<u64>,
    ) -> Result<ExecutionResult> {
        let request = ExecutionRequest::new(command, arguments)?;
        let timeout = self.config.resolve_timeout(timeout_ms)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("run permits closed: {}", e)))?;

        debug!(
            command = %request.command(),
            available_permits = self.permits.available_permits(),
            "Run slot acquired"
        );

        let result = self.runner.run(&request, timeout).await;

        info!(
            command = %request.command(),
            exit_code = result.exit_code,
            outcome = %result.outcome,
            duration_ms = result.duration_ms,
            "Script run finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, ExecutionOutcome, SENTINEL_EXIT_CODE};
    use crate::port::script_runner::mocks::MockScriptRunner;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_delegates_to_runner() {
        let runner = Arc::new(MockScriptRunner::new_echo());
        let service = RunScriptService::new(runner.clone(), RunnerConfig::default());

        let result = service
            .run("echo", vec!["a b".to_string(), "c".to_string()], None)
            .await
            .unwrap();

        assert_eq!(result.stdout, "a b\nc\n");
        assert_eq!(result.exit_code, 0);
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_run_from_blocking_caller() {
        let service = RunScriptService::new(
            Arc::new(MockScriptRunner::new_echo()),
            RunnerConfig::default(),
        );

        let result = tokio_test::block_on(service.run("echo", vec!["x".to_string()], Some(10)));

        assert_eq!(result.unwrap().stdout, "x\n");
    }

    #[tokio::test]
    async fn test_empty_command_is_validation_error() {
        let runner = Arc::new(MockScriptRunner::new_echo());
        let service = RunScriptService::new(runner.clone(), RunnerConfig::default());

        let err = service.run("", vec![], None).await.unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::EmptyCommand)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_timeout_is_validation_error() {
        let runner = Arc::new(MockScriptRunner::new_echo());
        let service = RunScriptService::new(runner.clone(), RunnerConfig::default());

        let err = service.run("echo", vec![], Some(0)).await.unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::NonPositiveTimeout)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sentinel_result_is_not_an_error() {
        let runner = Arc::new(MockScriptRunner::new_fixed(ExecutionResult::launch_failed(
            "No such file or directory (os error 2)",
        )));
        let service = RunScriptService::new(runner, RunnerConfig::default());

        let result = service.run("/missing", vec![], None).await.unwrap();

        assert_eq!(result.exit_code, SENTINEL_EXIT_CODE);
        assert_eq!(result.outcome, ExecutionOutcome::LaunchFailed);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let runner = Arc::new(MockScriptRunner::new_sleeping(Duration::from_millis(50)));
        let config = RunnerConfig {
            max_concurrent_runs: 2,
            ..Default::default()
        };
        let service = Arc::new(RunScriptService::new(runner.clone(), config));

        let mut handles = vec![];
        for i in 0..6 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.run("echo", vec![format!("{}", i)], None).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(runner.call_count(), 6);
        assert!(
            runner.peak_in_flight() <= 2,
            "Expected at most 2 overlapping runs, got {}",
            runner.peak_in_flight()
        );
    }
}
