use crate::process::{Enqueue, RunOptions, RunResult};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Serializes cwd changes across test threads.
static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Runs a test from another working directory, restoring the previous one on drop.
///
/// Relative media paths resolve against the cwd, so tests covering them swap it.
pub(crate) struct DirGuard {
    previous: PathBuf,
    _cwd: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(dir: &Path) -> Self {
        let cwd = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self {
            previous,
            _cwd: cwd,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

/// Runner that records every call and replays a canned result.
pub(crate) struct RecordingRunner {
    result: RunResult,
    calls: Mutex<Vec<(Vec<String>, RunOptions)>>,
}

impl RecordingRunner {
    pub(crate) fn new(result: RunResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Vec<String>, RunOptions)> {
        self.calls.lock().unwrap().clone()
    }

    /// Argv of the only recorded call.
    pub(crate) fn single_argv(&self) -> Vec<String> {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one run");
        calls[0].0.clone()
    }
}

impl crate::process::CommandRunner for RecordingRunner {
    fn run(&self, argv: &[String], opts: &RunOptions) -> RunResult {
        self.calls
            .lock()
            .unwrap()
            .push((argv.to_vec(), opts.clone()));
        self.result.clone()
    }
}

/// Queue that admits immediately, optionally reporting a fixed wait.
#[derive(Default)]
pub(crate) struct ImmediateQueue {
    pub(crate) simulated_wait: Option<(Duration, usize)>,
}

impl ImmediateQueue {
    pub(crate) fn waiting(wait: Duration, ahead: usize) -> Self {
        Self {
            simulated_wait: Some((wait, ahead)),
        }
    }
}

impl Enqueue for ImmediateQueue {
    fn enqueue<T>(
        &self,
        work: impl FnOnce() -> T,
        on_wait: impl FnOnce(Duration, usize),
    ) -> T {
        if let Some((wait, ahead)) = self.simulated_wait {
            on_wait(wait, ahead);
        }
        work()
    }
}
