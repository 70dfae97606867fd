// Subprocess script runner implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use cyborg_core::domain::{
    ExecutionRequest, ExecutionResult, ExecutionTimeout, SENTINEL_EXIT_CODE,
};
use cyborg_core::port::{ScriptRunner, TimeProvider};

/// How long pipes may stay open after the child itself has exited
///
/// A backgrounded descendant inherits stdout/stderr and can hold them open
/// long after the script is done. Past this window the group is killed and
/// whatever was captured is returned.
const PIPE_DRAIN_WINDOW: Duration = Duration::from_millis(100);

/// Both output pipes and everything read from them so far
///
/// Reads go through fixed chunks, so cutting a drain short never loses bytes
/// that were already read.
struct OutputCapture {
    stdout_pipe: Option<ChildStdout>,
    stderr_pipe: Option<ChildStderr>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl OutputCapture {
    fn take(child: &mut Child) -> Self {
        Self {
            stdout_pipe: child.stdout.take(),
            stderr_pipe: child.stderr.take(),
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    /// Read both pipes until EOF
    async fn drain(&mut self) -> std::io::Result<()> {
        tokio::try_join!(
            read_into(&mut self.stdout_pipe, &mut self.stdout),
            read_into(&mut self.stderr_pipe, &mut self.stderr),
        )?;
        Ok(())
    }
}

/// Subprocess script runner
/// Spawns the target directly with an argument vector (no shell) and races it
/// against a wall-clock timeout
pub struct SubprocessScriptRunner {
    time_provider: Arc<dyn TimeProvider>,
    kill_grace: Duration,
}

impl SubprocessScriptRunner {
    /// Create a new subprocess runner
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessScriptRunner::new(Arc::new(SystemTimeProvider))
    ///     .with_kill_grace(Duration::from_millis(500));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            kill_grace: Duration::ZERO,
        }
    }

    /// Send SIGTERM and wait up to `grace` before SIGKILL on timeout
    ///
    /// Zero (the default) skips SIGTERM. A non-zero grace delays the timeout
    /// result by at most `grace`.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Build the child command: direct exec, separate pipes, own process group
    fn build_command(request: &ExecutionRequest) -> Command {
        let mut std_cmd = std::process::Command::new(request.command());
        std_cmd
            .args(request.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // pgid == pid, so the whole tree can be signalled at once
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Build execution result from a child that exited on its own
    fn build_result(capture: &OutputCapture, status: ExitStatus) -> ExecutionResult {
        let stdout = String::from_utf8_lossy(&capture.stdout).into_owned();
        let mut stderr = String::from_utf8_lossy(&capture.stderr).into_owned();

        let exit_code = match status.code() {
            Some(code) => code,
            None => {
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                match termination_signal(&status) {
                    Some(signal) => stderr.push_str(&format!("terminated by signal {}", signal)),
                    None => stderr.push_str("process exited without a status code"),
                }
                SENTINEL_EXIT_CODE
            }
        };

        ExecutionResult::completed(stdout, stderr, exit_code)
    }

    /// Internal run method (extracted for function length compliance)
    async fn run_internal(
        &self,
        request: &ExecutionRequest,
        timeout: ExecutionTimeout,
    ) -> ExecutionResult {
        let mut child = match Self::build_command(request).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    command = %request.command(),
                    error = %e,
                    "Failed to launch script"
                );
                return ExecutionResult::launch_failed(e.to_string());
            }
        };

        // Captured now: once the child is reaped `child.id()` is gone, but
        // descendants may still hold the process group
        let pid = child.id();
        let mut capture = OutputCapture::take(&mut child);

        // Timeout polls the inner future first, so a tie goes to completion
        let waited = tokio::time::timeout(
            timeout.as_duration(),
            wait_with_output(&mut child, &mut capture),
        )
        .await;

        match waited {
            Ok(Ok(status)) => {
                self.drain_after_exit(request, &mut capture, pid).await;
                Self::build_result(&capture, status)
            }
            Ok(Err(e)) => {
                warn!(
                    command = %request.command(),
                    pid = ?pid,
                    error = %e,
                    "Lost track of script output, terminating"
                );
                self.terminate(&mut child, pid).await;
                ExecutionResult::internal(format!("failed to collect script output: {}", e))
            }
            Err(_) => {
                warn!(
                    command = %request.command(),
                    pid = ?pid,
                    timeout_ms = timeout.as_millis(),
                    "Script timed out, terminating"
                );
                self.terminate(&mut child, pid).await;
                ExecutionResult::timed_out(timeout)
            }
        }
    }

    /// Collect output still buffered in the pipes once the child has exited
    ///
    /// Runs outside the caller's timeout: the script finished in time, so the
    /// result is `Completed` whatever its descendants do.
    async fn drain_after_exit(
        &self,
        request: &ExecutionRequest,
        capture: &mut OutputCapture,
        pid: Option<u32>,
    ) {
        match tokio::time::timeout(PIPE_DRAIN_WINDOW, capture.drain()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    command = %request.command(),
                    error = %e,
                    "Output read failed after script exit, keeping what was captured"
                );
            }
            Err(_) => {
                warn!(
                    command = %request.command(),
                    pid = ?pid,
                    "Script exited but descendants still hold its output pipes, killing group"
                );
                #[cfg(unix)]
                if let Some(pid) = pid {
                    kill_group(pid);
                }
            }
        }
    }

    /// Terminate the child and its process group, then reap the child
    async fn terminate(&self, child: &mut Child, pid: Option<u32>) {
        #[cfg(unix)]
        if let Some(pid) = pid {
            self.kill_process_group(child, pid).await;
        }
        #[cfg(not(unix))]
        let _ = pid;

        match child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                // kill() also waits, so the child never lingers as a zombie
                if let Err(e) = child.kill().await {
                    warn!(pid = ?pid, error = %e, "Failed to kill script process");
                }
            }
        }
    }

    /// SIGTERM (optional grace) then SIGKILL to the whole process group
    #[cfg(unix)]
    async fn kill_process_group(&self, child: &mut Child, pid: u32) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(pid as i32);

        if !self.kill_grace.is_zero() {
            info!(pid = %pid, "Sending SIGTERM to process group");
            match killpg(pgid, Signal::SIGTERM) {
                Ok(()) => {
                    if let Ok(Ok(status)) = tokio::time::timeout(self.kill_grace, child.wait()).await
                    {
                        info!(pid = %pid, status = %status, "Script exited after SIGTERM");
                    }
                }
                Err(Errno::ESRCH) => return,
                Err(e) => warn!(pid = %pid, error = %e, "SIGTERM failed"),
            }
        }

        kill_group(pid);
    }
}

/// SIGKILL every process left in the group led by `pid`
#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid = %pid, error = %e, "SIGKILL failed"),
    }
}

/// Wait for the child to exit while draining its pipes
///
/// Pipes are read while waiting, so a chatty child cannot block on a full
/// pipe buffer. The child's exit, not pipe EOF, ends the wait.
async fn wait_with_output(
    child: &mut Child,
    capture: &mut OutputCapture,
) -> std::io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        drained = capture.drain() => {
            drained?;
            debug!("Output pipes closed, waiting for exit");
            child.wait().await
        }
    }
}

/// Append everything readable from `pipe` to `buf`; the pipe is dropped at EOF
async fn read_into<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<()> {
    let mut chunk = [0u8; 8192];
    while let Some(reader) = pipe.as_mut() {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            *pipe = None;
        } else {
            buf.extend_from_slice(&chunk[..n]);
        }
    }
    Ok(())
}

#[cfg(unix)]
fn termination_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[async_trait]
impl ScriptRunner for SubprocessScriptRunner {
    async fn run(&self, request: &ExecutionRequest, timeout: ExecutionTimeout) -> ExecutionResult {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %request.command(),
            arg_count = request.arguments().len(),
            timeout_ms = timeout.as_millis(),
            "Starting script execution"
        );

        let result = self.run_internal(request, timeout).await;
        let duration_ms = self.time_provider.elapsed_millis(start_time);

        info!(
            command = %request.command(),
            duration_ms = %duration_ms,
            exit_code = result.exit_code,
            outcome = %result.outcome,
            "Script execution completed"
        );

        result.with_duration(duration_ms)
    }
}
