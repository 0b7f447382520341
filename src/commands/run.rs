//! Implementation of the `cmdreply run` command.

use super::message::PreparedMessage;
use crate::cli::MessageArgs;
use crate::error::{ReplyError, Result};
use crate::process::{CommandQueue, ProcessRunner};
use crate::reply::run_command_reply;

/// Execute the `cmdreply run` command.
///
/// Runs the configured reply command once and prints the result as JSON.
/// A failed or timed-out command is still a successful run of this command;
/// the outcome is reported in the printed metadata.
pub fn cmd_run(args: MessageArgs) -> Result<()> {
    let prepared = PreparedMessage::from_args(&args)?;
    let queue = CommandQueue::new(prepared.config.queue.max_concurrent);
    let runner = ProcessRunner::new();

    let result = run_command_reply(&prepared.params(), &runner, &queue);

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| ReplyError::Io(format!("failed to serialize reply result: {}", e)))?;
    println!("{}", json);
    Ok(())
}
