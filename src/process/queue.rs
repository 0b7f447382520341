//! Admission queue for reply commands.
//!
//! Work is admitted strictly in arrival order (ticket order) and at most
//! `max_concurrent` units run at once. A caller that has to wait is told,
//! once and before its work starts, how long it waited and how many entries
//! were ahead of it when it arrived.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Serializes or bounds concurrent work.
pub trait Enqueue {
    /// Run `work` once admitted.
    ///
    /// `on_wait(wait, ahead)` is called at most once, before `work` starts,
    /// and only if admission was delayed.
    fn enqueue<T>(
        &self,
        work: impl FnOnce() -> T,
        on_wait: impl FnOnce(Duration, usize),
    ) -> T;
}

/// FIFO queue with bounded concurrency.
#[derive(Debug)]
pub struct CommandQueue {
    max_concurrent: usize,
    state: Mutex<QueueState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct QueueState {
    /// Ticket handed to the next arrival.
    next_ticket: u64,
    /// Lowest ticket not yet admitted.
    now_serving: u64,
    /// Admitted entries still running.
    running: usize,
}

impl QueueState {
    fn waiting(&self) -> usize {
        (self.next_ticket - self.now_serving) as usize
    }
}

impl CommandQueue {
    /// Create a queue admitting up to `max_concurrent` units at once (minimum 1).
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            state: Mutex::new(QueueState::default()),
            changed: Condvar::new(),
        }
    }

    /// Create a queue that runs one unit at a time.
    pub fn serial() -> Self {
        Self::new(1)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Entries currently waiting or running.
    pub fn pending(&self) -> usize {
        let state = self.lock();
        state.waiting() + state.running
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until admitted; returns the slot plus `(wait, ahead)` if we waited.
    fn admit(&self) -> (Slot<'_>, Option<(Duration, usize)>) {
        let arrived = Instant::now();
        let mut state = self.lock();

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let ahead = (ticket - state.now_serving) as usize + state.running;

        let mut waited = false;
        while ticket != state.now_serving || state.running >= self.max_concurrent {
            waited = true;
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        state.now_serving += 1;
        state.running += 1;
        drop(state);
        // The next ticket may fit in a remaining slot.
        self.changed.notify_all();

        let wait = waited.then(|| (arrived.elapsed(), ahead));
        (Slot { queue: self }, wait)
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::serial()
    }
}

impl Enqueue for CommandQueue {
    fn enqueue<T>(
        &self,
        work: impl FnOnce() -> T,
        on_wait: impl FnOnce(Duration, usize),
    ) -> T {
        let (_slot, wait) = self.admit();
        if let Some((waited, ahead)) = wait {
            on_wait(waited, ahead);
        }
        work()
    }
}

/// RAII guard for a running slot.
///
/// Dropping it (including during a panic in the work) frees the slot.
struct Slot<'a> {
    queue: &'a CommandQueue,
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.lock();
        state.running = state.running.saturating_sub(1);
        drop(state);
        self.queue.changed.notify_all();
    }
}
