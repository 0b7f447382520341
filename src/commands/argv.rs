//! Implementation of the `cmdreply argv` command.

use super::message::PreparedMessage;
use crate::cli::MessageArgs;
use crate::error::Result;
use crate::reply::build_argv;

/// Execute the `cmdreply argv` command.
///
/// Prints the shell-quoted argv that `run` would execute.
pub fn cmd_argv(args: MessageArgs) -> Result<()> {
    let prepared = PreparedMessage::from_args(&args)?;
    println!("{}", render_argv(&prepared));
    Ok(())
}

fn render_argv(prepared: &PreparedMessage) -> String {
    let argv = build_argv(prepared.reply(), &prepared.ctx, prepared.turn);
    shell_words::join(&argv)
}
