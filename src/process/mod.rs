//! External process plumbing for reply commands.
//!
//! - **Queue**: FIFO admission with bounded concurrency and wait reporting
//! - **Exec**: subprocess execution with timeout, kill and output capture
//!
//! Both sit behind traits ([`Enqueue`], [`CommandRunner`]) so the reply
//! pipeline can be driven by fakes in tests.

mod exec;
mod queue;

pub use exec::{CommandRunner, ExecutionOutcome, ProcessRunner, RunFailure, RunOptions, RunResult};
pub use queue::{CommandQueue, Enqueue};
