// Script Runner Port
// Abstraction for executing an external program and normalizing its outcome

use crate::domain::{ExecutionRequest, ExecutionResult, ExecutionTimeout};
use async_trait::async_trait;

/// Script Runner trait
///
/// Every outcome (success, non-zero exit, timeout, launch failure) comes back
/// as an `ExecutionResult`; there is no error channel. Implementations own
/// exactly one child process per call and must release it on every path.
///
/// Implementations:
/// - SubprocessScriptRunner: spawns the target via tokio::process
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `request` to completion or until `timeout` elapses
    async fn run(&self, request: &ExecutionRequest, timeout: ExecutionTimeout) -> ExecutionResult;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Completed run whose stdout is the arguments, one per line
        Echo,
        /// Always return this result
        Fixed(ExecutionResult),
        /// Panic with message (for fault isolation testing)
        Panic(String),
        /// Sleep, then behave like Echo
        Sleep(Duration),
    }

    /// Mock Script Runner for testing
    pub struct MockScriptRunner {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl MockScriptRunner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn new_echo() -> Self {
            Self::new(MockBehavior::Echo)
        }

        pub fn new_fixed(result: ExecutionResult) -> Self {
            Self::new(MockBehavior::Fixed(result))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn new_sleeping(duration: Duration) -> Self {
            Self::new(MockBehavior::Sleep(duration))
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        /// Highest number of overlapping `run` calls observed
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        fn echo(request: &ExecutionRequest) -> ExecutionResult {
            let mut stdout = request.arguments().join("\n");
            if !stdout.is_empty() {
                stdout.push('\n');
            }
            ExecutionResult::completed(stdout, String::new(), 0)
        }
    }

    #[async_trait]
    impl ScriptRunner for MockScriptRunner {
        async fn run(
            &self,
            request: &ExecutionRequest,
            _timeout: ExecutionTimeout,
        ) -> ExecutionResult {
            *self.call_count.lock().unwrap() += 1;
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            let behavior = self.behavior.lock().unwrap().clone();

            let result = match behavior {
                MockBehavior::Echo => Self::echo(request),
                MockBehavior::Fixed(result) => result,
                MockBehavior::Panic(msg) => {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    panic!("{}", msg); // Actually panic for fault isolation testing
                }
                MockBehavior::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    Self::echo(request)
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}
