//! The command auto-reply pipeline.
//!
//! One inbound message becomes one external command invocation:
//!
//! 1. **Argv**: render and augment the configured command ([`build_argv`])
//! 2. **Queue**: wait for admission through an [`Enqueue`] implementation
//! 3. **Exec**: run the argv through a [`CommandRunner`]
//! 4. **Interpret**: decode structured output and split out media tokens
//! 5. **Classify**: turn the outcome into `(payload?, meta)`
//!
//! The pipeline never fails: every error becomes a result with no payload,
//! except timeouts which produce a user-facing notice.

mod argv;
mod media;
mod outcome;
mod output;
mod summary;

pub use argv::{
    TurnState, build_argv, ensure_agent_flags, frame_body, insert_session_args,
    insert_template_prefix,
};
pub use media::{MediaSplit, filter_media_by_size, is_remote_url, split_media_from_output};
pub use outcome::{
    CommandReplyResult, NO_OUTPUT_NOTICE, PARTIAL_OUTPUT_LIMIT, ReplyMeta, ReplyPayload, Timing,
    classify_failure, classify_settled, no_output_notice, timeout_notice,
};
pub use output::{
    InterpretedOutput, StructuredOutput, decode_structured_output, interpret_output,
    wants_structured_decode,
};
pub use summary::summarize_metadata;

use crate::agent::is_agent_invocation;
use crate::config::ReplyConfig;
use crate::process::{CommandRunner, Enqueue, RunOptions};
use crate::template::TemplateContext;
use std::time::Duration;
use tracing::debug;

/// Inputs for one reply invocation.
#[derive(Debug, Clone)]
pub struct CommandReplyParams<'a> {
    pub reply: &'a ReplyConfig,
    pub templating_ctx: &'a TemplateContext,
    pub turn: TurnState,
    pub timeout: Duration,
}

impl<'a> CommandReplyParams<'a> {
    /// Params using the configured timeout.
    pub fn new(reply: &'a ReplyConfig, templating_ctx: &'a TemplateContext, turn: TurnState) -> Self {
        Self {
            reply,
            templating_ctx,
            turn,
            timeout: reply.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Run the configured command for one message and classify the result.
pub fn run_command_reply<R, Q>(
    params: &CommandReplyParams<'_>,
    runner: &R,
    queue: &Q,
) -> CommandReplyResult
where
    R: CommandRunner + ?Sized,
    Q: Enqueue + ?Sized,
{
    let argv = build_argv(params.reply, params.templating_ctx, params.turn);
    let is_agent = is_agent_invocation(&argv);
    let opts = RunOptions {
        timeout: params.timeout,
        cwd: params.reply.cwd.clone(),
    };

    let mut timing = Timing::start();
    let mut queued = None;
    let result = queue.enqueue(
        || runner.run(&argv, &opts),
        |waited, ahead| {
            debug!(
                "Command auto-reply queued for {}ms ({} ahead)",
                waited.as_millis(),
                ahead
            );
            queued = Some((waited, ahead));
        },
    );
    timing.queued = queued;

    match result {
        Ok(outcome) => classify_settled(params.reply, &outcome, is_agent, &timing),
        Err(failure) => classify_failure(params.reply, &failure, params.timeout, &timing),
    }
}
