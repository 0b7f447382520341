//! Command implementations for cmdreply.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod argv;
mod message;
mod run;
mod summarize;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Argv(args) => argv::cmd_argv(args),
        Command::Summarize(args) => summarize::cmd_summarize(args),
    }
}
