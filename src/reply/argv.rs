//! Argv construction for reply commands.
//!
//! The final argv is produced by a fixed sequence of transforms, each taking
//! the previous argv by reference and returning a new one:
//!
//! 1. render the command tokens
//! 2. insert the prefix template at index 1 (subject to send-once rules)
//! 3. ensure `--output-format <hint>` and `-p` for the agent tool
//! 4. insert session continuity arguments
//! 5. frame the final argument with the agent identity prefix
//!
//! Steps 4 and 5 are order-sensitive: session arguments go before the body,
//! and the identity prefix must wrap the body that is last after step 4.

use crate::agent::{AGENT_IDENTITY_PREFIX, is_agent_invocation};
use crate::config::{ReplyConfig, SessionConfig};
use crate::template::{TemplateContext, render_all, render_template};
use tracing::debug;

const OUTPUT_FORMAT_FLAG: &str = "--output-format";
const PRINT_FLAGS: [&str; 2] = ["-p", "--print"];

/// Per-turn facts that decide which optional arguments are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnState {
    /// Suppress the prefix template after it was sent once in this session.
    pub send_system_once: bool,
    pub is_new_session: bool,
    pub is_first_turn_in_session: bool,
    /// The prefix template has already been delivered in this session.
    pub system_sent: bool,
}

impl TurnState {
    /// Whether the prefix template goes out on this turn.
    pub fn wants_prefix(&self) -> bool {
        !self.send_system_once || self.is_first_turn_in_session || !self.system_sent
    }
}

/// Build the full argv for one reply.
pub fn build_argv(reply: &ReplyConfig, ctx: &TemplateContext, turn: TurnState) -> Vec<String> {
    let argv = render_all(&reply.command, ctx);

    let argv = match &reply.template {
        Some(template) if turn.wants_prefix() => {
            insert_template_prefix(&argv, &render_template(template, ctx))
        }
        _ => argv,
    };

    let argv = match &reply.claude_output_format {
        Some(format) if is_agent_invocation(&argv) => ensure_agent_flags(&argv, format),
        _ => argv,
    };

    let argv = match &reply.session {
        Some(session) => insert_session_args(&argv, session, turn.is_new_session, ctx),
        None => argv,
    };

    let argv = if is_agent_invocation(&argv) {
        frame_body(&argv, AGENT_IDENTITY_PREFIX)
    } else {
        argv
    };

    debug!(
        "Running command auto-reply: {}{}",
        argv.join(" "),
        reply
            .cwd
            .as_ref()
            .map(|cwd| format!(" (cwd: {})", cwd.display()))
            .unwrap_or_default()
    );

    argv
}

/// Insert a rendered prefix as the second element.
///
/// An empty prefix or an empty argv is returned unchanged.
pub fn insert_template_prefix(argv: &[String], prefix: &str) -> Vec<String> {
    if prefix.is_empty() || argv.is_empty() {
        return argv.to_vec();
    }
    insert_at(argv, 1, [prefix.to_string()])
}

/// Ensure the agent tool runs non-interactively with the given output format.
///
/// Missing flags are inserted before the last element; present ones are kept.
pub fn ensure_agent_flags(argv: &[String], output_format: &str) -> Vec<String> {
    let has_output_format = argv.iter().any(|part| {
        part == OUTPUT_FORMAT_FLAG || part.starts_with(&format!("{}=", OUTPUT_FORMAT_FLAG))
    });
    let argv = if has_output_format {
        argv.to_vec()
    } else {
        insert_at(
            argv,
            before_last(argv),
            [OUTPUT_FORMAT_FLAG.to_string(), output_format.to_string()],
        )
    };

    let has_print_flag = argv.iter().any(|part| PRINT_FLAGS.contains(&part.as_str()));
    if has_print_flag {
        argv
    } else {
        insert_at(&argv, before_last(&argv), [PRINT_FLAGS[0].to_string()])
    }
}

/// Insert rendered session arguments before the body, or append them.
///
/// With fewer than two elements there is no separate body, so the
/// arguments are appended even when before-body insertion is configured.
pub fn insert_session_args(
    argv: &[String],
    session: &SessionConfig,
    is_new_session: bool,
    ctx: &TemplateContext,
) -> Vec<String> {
    let args = render_all(&session.arg_templates(is_new_session), ctx);
    if args.is_empty() {
        return argv.to_vec();
    }

    let at = if session.session_arg_before_body && argv.len() > 1 {
        argv.len() - 1
    } else {
        argv.len()
    };
    insert_at(argv, at, args)
}

/// Replace the last element with `<prefix>\n\n<body>`.
///
/// Empty parts are skipped so an empty prefix leaves the body untouched.
pub fn frame_body(argv: &[String], prefix: &str) -> Vec<String> {
    let Some((body, head)) = argv.split_last() else {
        return Vec::new();
    };
    let framed = [prefix, body.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut out = head.to_vec();
    out.push(framed);
    out
}

fn before_last(argv: &[String]) -> usize {
    argv.len().saturating_sub(1)
}

fn insert_at<I>(argv: &[String], at: usize, items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let at = at.min(argv.len());
    argv[..at]
        .iter()
        .cloned()
        .chain(items)
        .chain(argv[at..].iter().cloned())
        .collect()
}
