//! Timeout-bounded subprocess runner.
//!
//! Runs one argv to completion or kills it once the deadline passes.
//! Stdout and stderr are drained on background threads so a chatty child
//! cannot block on a full pipe while we poll for its exit.

use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Signal reported for processes killed at the deadline.
pub const TIMEOUT_SIGNAL: &str = "SIGKILL";

/// How long to keep reading after a kill before taking the partial output.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if the process was terminated by a signal).
    pub code: Option<i32>,
    /// Name of the terminating signal, if any.
    pub signal: Option<String>,
    /// Whether the runner killed the process.
    pub killed: bool,
}

/// A run that did not settle normally: timeout kill, spawn failure, or a
/// failure while waiting on the child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RunFailure {
    pub message: String,
    pub killed: bool,
    pub signal: Option<String>,
    /// Output captured before the failure.
    pub stdout: String,
    pub stderr: String,
}

impl RunFailure {
    /// Failure for a process killed at its deadline.
    pub fn timed_out(timeout: Duration, stdout: String, stderr: String) -> Self {
        Self {
            message: format!("command timed out after {}ms", timeout.as_millis()),
            killed: true,
            signal: Some(TIMEOUT_SIGNAL.to_string()),
            stdout,
            stderr,
        }
    }

    /// Failure that carries only a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Whether this failure was a deadline kill.
    pub fn is_timeout(&self) -> bool {
        self.killed || self.signal.as_deref() == Some(TIMEOUT_SIGNAL)
    }
}

/// Outcome of one runner invocation.
pub type RunResult = std::result::Result<ExecutionOutcome, RunFailure>;

/// Options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub timeout: Duration,
    pub cwd: Option<PathBuf>,
}

/// Runs an argv and reports how it ended.
pub trait CommandRunner {
    fn run(&self, argv: &[String], opts: &RunOptions) -> RunResult;
}

impl<F> CommandRunner for F
where
    F: Fn(&[String], &RunOptions) -> RunResult,
{
    fn run(&self, argv: &[String], opts: &RunOptions) -> RunResult {
        self(argv, opts)
    }
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how often the child is polled for exit.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], opts: &RunOptions) -> RunResult {
        let Some((program, args)) = argv.split_first() else {
            return Err(RunFailure::other("cannot run an empty command"));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &opts.cwd {
            command.current_dir(cwd);
        }

        let deadline = deadline_after(opts.timeout);
        let mut child = command.spawn().map_err(|e| {
            RunFailure::other(format!("failed to execute command '{}': {}", program, e))
        })?;

        let mut stdout = OutputDrain::spawn(child.stdout.take());
        let mut stderr = OutputDrain::spawn(child.stderr.take());

        match wait_until_deadline(&mut child, deadline, self.poll_interval) {
            Ok(Some(status)) => {
                // A backgrounded descendant can inherit the pipes and hold
                // them open past the child's exit.
                let stdout_closed = stdout.wait_until(deadline);
                let stderr_closed = stderr.wait_until(deadline);
                if !(stdout_closed && stderr_closed) {
                    return Err(RunFailure::timed_out(
                        opts.timeout,
                        stdout.snapshot(),
                        stderr.snapshot(),
                    ));
                }
                Ok(ExecutionOutcome {
                    stdout: stdout.snapshot(),
                    stderr: stderr.snapshot(),
                    code: status.code(),
                    signal: exit_signal(&status),
                    killed: false,
                })
            }
            Ok(None) => {
                let grace = Instant::now() + DRAIN_GRACE;
                stdout.wait_until(grace);
                stderr.wait_until(grace);
                Err(RunFailure::timed_out(
                    opts.timeout,
                    stdout.snapshot(),
                    stderr.snapshot(),
                ))
            }
            Err(e) => Err(RunFailure {
                message: format!("failed to check process status: {}", e),
                stdout: stdout.snapshot(),
                stderr: stderr.snapshot(),
                ..Default::default()
            }),
        }
    }
}

/// `now + timeout`, saturating for timeouts too large to represent.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}

/// Wait for a child process until `deadline`.
///
/// Returns `Ok(None)` if the deadline passed and the child was killed.
fn wait_until_deadline(
    child: &mut Child,
    deadline: Instant,
    poll_interval: Duration,
) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            kill_process(child);
            return Ok(None);
        }
        std::thread::sleep(poll_interval.min(remaining));
    }
}

/// Kill a process and reap it.
fn kill_process(child: &mut Child) {
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}

/// Background reader collecting one output stream.
///
/// The reader thread is detached. It ends when every holder of the pipe's
/// write end has closed it, which may be after the run returns.
struct OutputDrain {
    buffer: Arc<Mutex<Vec<u8>>>,
    /// Signals end of stream; `None` once observed or if there was no stream.
    done: Option<Receiver<()>>,
}

impl OutputDrain {
    fn spawn<R: Read + Send + 'static>(source: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let done = source.map(|mut source| {
            let sink = Arc::clone(&buffer);
            let (done_tx, done_rx) = mpsc::channel();
            std::thread::spawn(move || {
                let mut chunk = [0u8; 8192];
                loop {
                    match source.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => sink
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = done_tx.send(());
            });
            done_rx
        });
        Self { buffer, done }
    }

    /// Wait for end of stream until `deadline`; true if the stream closed.
    fn wait_until(&mut self, deadline: Instant) -> bool {
        let Some(done) = &self.done else {
            return true;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        match done.recv_timeout(remaining) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.done = None;
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Everything read so far, without waiting.
    fn snapshot(&self) -> String {
        let bytes = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(signal_name)
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<String> {
    None
}

#[cfg_attr(not(unix), allow(dead_code))]
fn signal_name(signal: i32) -> String {
    let name = match signal {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        6 => "SIGABRT",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        14 => "SIGALRM",
        15 => "SIGTERM",
        other => return format!("SIG{}", other),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn opts(timeout_ms: u64) -> RunOptions {
        RunOptions {
            timeout: Duration::from_millis(timeout_ms),
            cwd: None,
        }
    }

    fn runner() -> ProcessRunner {
        ProcessRunner::new().with_poll_interval(Duration::from_millis(10))
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_and_stderr() {
        let outcome = runner()
            .run(&argv(&["sh", "-c", "echo out; echo err >&2"]), &opts(5_000))
            .unwrap();

        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
        assert_eq!(outcome.code, Some(0));
        assert_eq!(outcome.signal, None);
        assert!(!outcome.killed);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_nonzero_exit() {
        let outcome = runner()
            .run(&argv(&["sh", "-c", "exit 3"]), &opts(5_000))
            .unwrap();
        assert_eq!(outcome.code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_terminating_signal() {
        let outcome = runner()
            .run(&argv(&["sh", "-c", "kill -TERM $$"]), &opts(5_000))
            .unwrap();
        assert_eq!(outcome.code, None);
        assert_eq!(outcome.signal.as_deref(), Some("SIGTERM"));
        assert!(!outcome.killed);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_uses_cwd() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "here").unwrap();

        let outcome = runner()
            .run(
                &argv(&["cat", "marker.txt"]),
                &RunOptions {
                    timeout: Duration::from_secs(5),
                    cwd: Some(temp_dir.path().to_path_buf()),
                },
            )
            .unwrap();
        assert_eq!(outcome.stdout, "here");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_kills_on_timeout() {
        let started = Instant::now();
        let failure = runner()
            .run(&argv(&["sleep", "10"]), &opts(200))
            .unwrap_err();

        assert!(failure.killed);
        assert_eq!(failure.signal.as_deref(), Some("SIGKILL"));
        assert!(failure.is_timeout());
        assert!(failure.message.contains("timed out after 200ms"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_keeps_partial_output() {
        let failure = runner()
            .run(&argv(&["sh", "-c", "echo partial; exec sleep 10"]), &opts(500))
            .unwrap_err();

        assert!(failure.is_timeout());
        assert_eq!(failure.stdout, "partial\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_background_descendant_cannot_outlive_deadline() {
        let started = Instant::now();
        let failure = runner()
            .run(&argv(&["sh", "-c", "echo hi; sleep 5 &"]), &opts(1_000))
            .unwrap_err();

        assert!(failure.is_timeout());
        assert_eq!(failure.stdout, "hi\n");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_descendant_output_collected_within_deadline() {
        let outcome = runner()
            .run(
                &argv(&["sh", "-c", "echo hi; (sleep 0.2; echo late) &"]),
                &opts(5_000),
            )
            .unwrap();

        assert_eq!(outcome.stdout, "hi\nlate\n");
        assert_eq!(outcome.code, Some(0));
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        assert!(deadline_after(Duration::MAX) > Instant::now());
    }

    #[test]
    fn test_empty_argv_fails() {
        let failure = runner().run(&[], &opts(1_000)).unwrap_err();
        assert!(!failure.is_timeout());
        assert!(failure.message.contains("empty command"));
    }

    #[test]
    fn test_missing_executable_fails() {
        let failure = runner()
            .run(&argv(&["nonexistent_command_xyz_123"]), &opts(1_000))
            .unwrap_err();
        assert!(!failure.is_timeout());
        assert!(failure.message.contains("failed to execute"));
    }

    #[test]
    fn test_is_timeout_accepts_signal_alone() {
        let failure = RunFailure {
            signal: Some("SIGKILL".to_string()),
            ..Default::default()
        };
        assert!(failure.is_timeout());

        let failure = RunFailure {
            signal: Some("SIGTERM".to_string()),
            ..Default::default()
        };
        assert!(!failure.is_timeout());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(9), "SIGKILL");
        assert_eq!(signal_name(15), "SIGTERM");
        assert_eq!(signal_name(40), "SIG40");
    }

    #[test]
    fn test_closure_runner() {
        let fake = |argv: &[String], _opts: &RunOptions| -> RunResult {
            Ok(ExecutionOutcome {
                stdout: argv.join(" "),
                code: Some(0),
                ..Default::default()
            })
        };
        let outcome = fake.run(&argv(&["a", "b"]), &opts(1)).unwrap();
        assert_eq!(outcome.stdout, "a b");
    }
}
