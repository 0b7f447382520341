//! cmdreply: turn an inbound chat message into a reply by running an external
//! command, usually an agent CLI.
//!
//! The entry point is [`reply::run_command_reply`], which renders the
//! configured argv, waits for a slot in a [`process::CommandQueue`], runs the
//! command with a timeout and classifies the outcome into an optional
//! [`reply::ReplyPayload`] plus [`reply::ReplyMeta`].

pub mod agent;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod process;
pub mod reply;
pub mod template;

#[cfg(test)]
mod test_support;
