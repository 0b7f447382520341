//! Classification of a finished invocation into `(payload?, meta)`.
//!
//! Settled runs are checked in order: non-zero exit, killed without a
//! signal, then success. Failed runs are either a timeout (the only failure
//! that produces user-visible text) or an unknown failure.

use crate::config::ReplyConfig;
use crate::process::{ExecutionOutcome, RunFailure};
use crate::reply::media::{filter_media_by_size, split_media_from_output};
use crate::reply::output::interpret_output;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Partial output longer than this many characters is cut in timeout notices.
pub const PARTIAL_OUTPUT_LIMIT: usize = 800;

/// Reply text used when a successful command printed nothing.
pub const NO_OUTPUT_NOTICE: &str = "command produced no output";

/// The externally visible reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// First entry of `media_urls`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
}

impl ReplyPayload {
    /// Build a payload, or `None` when there is neither text nor media.
    pub fn new(text: String, media_urls: Vec<String>) -> Option<Self> {
        if text.is_empty() && media_urls.is_empty() {
            return None;
        }
        Some(Self {
            text: (!text.is_empty()).then_some(text),
            media_url: media_urls.first().cloned(),
            media_urls: (!media_urls.is_empty()).then_some(media_urls),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Execution telemetry, produced on every path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMeta {
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued_ahead: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killed: Option<bool>,
    /// Summary of the agent's structured output metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_summary: Option<String>,
}

/// Result of one reply invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandReplyResult {
    pub payload: Option<ReplyPayload>,
    pub meta: ReplyMeta,
}

/// Clock and queue observations for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub started: Instant,
    /// `(wait, ahead)` if the queue delayed admission.
    pub queued: Option<(Duration, usize)>,
}

impl Timing {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            queued: None,
        }
    }

    /// Meta with elapsed time and queue stats filled in.
    fn meta(&self) -> ReplyMeta {
        ReplyMeta {
            duration_ms: self.started.elapsed().as_millis() as u64,
            queued_ms: self.queued.map(|(wait, _)| wait.as_millis() as u64),
            queued_ahead: self.queued.map(|(_, ahead)| ahead),
            ..Default::default()
        }
    }
}

/// Classify a run that settled with an exit status.
pub fn classify_settled(
    reply: &ReplyConfig,
    outcome: &ExecutionOutcome,
    is_agent: bool,
    timing: &Timing,
) -> CommandReplyResult {
    log_stderr(&outcome.stderr);

    let interpreted = interpret_output(
        &outcome.stdout,
        reply.claude_output_format.as_deref(),
        is_agent,
    );
    let summary = interpreted.metadata_summary();
    let settled_meta = |timing: &Timing| ReplyMeta {
        exit_code: outcome.code,
        signal: outcome.signal.clone(),
        killed: Some(outcome.killed),
        metadata_summary: summary.clone(),
        ..timing.meta()
    };

    if outcome.code.unwrap_or(0) != 0 {
        warn!(
            "Command auto-reply exited with code {} (signal: {})",
            display_code(outcome.code),
            outcome.signal.as_deref().unwrap_or("none")
        );
        return CommandReplyResult {
            payload: None,
            meta: settled_meta(timing),
        };
    }

    if outcome.killed && outcome.signal.is_none() {
        warn!(
            "Command auto-reply process killed before completion (exit code {})",
            display_code(outcome.code)
        );
        return CommandReplyResult {
            payload: None,
            meta: settled_meta(timing),
        };
    }

    let split = split_media_from_output(&interpreted.text);
    if split.media_urls.is_empty() {
        debug!("No MEDIA token extracted from final text");
    } else {
        debug!("MEDIA token extracted: {:?}", split.media_urls);
    }

    let text = if split.text.is_empty() && split.media_urls.is_empty() {
        debug!("No text/media produced; injecting fallback notice to user");
        no_output_notice(summary.as_deref())
    } else {
        split.text
    };
    debug!(
        "Command auto-reply stdout (trimmed): {}",
        if text.is_empty() { "<empty>" } else { &text }
    );

    let media_urls = if split.media_urls.is_empty() {
        reply.media_url.iter().cloned().collect()
    } else {
        split.media_urls
    };
    let media_urls = match reply.media_max_bytes() {
        Some(max_bytes) if !media_urls.is_empty() => filter_media_by_size(&media_urls, max_bytes),
        _ => media_urls,
    };

    let result = CommandReplyResult {
        payload: ReplyPayload::new(text, media_urls),
        meta: settled_meta(timing),
    };
    debug!("Command auto-reply meta: {:?}", result.meta);
    result
}

/// Classify a run that failed to settle.
pub fn classify_failure(
    reply: &ReplyConfig,
    failure: &RunFailure,
    timeout: Duration,
    timing: &Timing,
) -> CommandReplyResult {
    log_stderr(&failure.stderr);

    let meta = ReplyMeta {
        signal: failure.signal.clone(),
        killed: Some(failure.killed),
        ..timing.meta()
    };

    if failure.is_timeout() {
        error!(
            "Command auto-reply timed out after {}ms (limit {}ms)",
            meta.duration_ms,
            timeout.as_millis()
        );
        let text = timeout_notice(timeout, reply.cwd.as_deref(), &failure.stdout);
        return CommandReplyResult {
            payload: Some(ReplyPayload::text(text)),
            meta,
        };
    }

    error!(
        "Command auto-reply failed after {}ms: {}",
        meta.duration_ms, failure
    );
    CommandReplyResult {
        payload: None,
        meta,
    }
}

/// Fallback text for a successful run without text or media.
pub fn no_output_notice(summary: Option<&str>) -> String {
    match summary {
        Some(summary) => format!("({}; {})", NO_OUTPUT_NOTICE, summary),
        None => format!("({})", NO_OUTPUT_NOTICE),
    }
}

/// User-facing text for a timed-out run.
pub fn timeout_notice(timeout: Duration, cwd: Option<&Path>, partial_stdout: &str) -> String {
    let cwd_note = cwd
        .map(|cwd| format!(" (cwd: {})", cwd.display()))
        .unwrap_or_default();
    let base = format!(
        "Command timed out after {}s{}. Try a shorter prompt or split the request.",
        timeout.as_secs(),
        cwd_note
    );

    let partial = partial_stdout.trim();
    if partial.is_empty() {
        return base;
    }
    let snippet = match partial.char_indices().nth(PARTIAL_OUTPUT_LIMIT) {
        Some((idx, _)) => format!("{}...", &partial[..idx]),
        None => partial.to_string(),
    };
    format!("{}\n\nPartial output before timeout:\n{}", base, snippet)
}

fn log_stderr(stderr: &str) {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        debug!("Command auto-reply stderr: {}", stderr);
    }
}

fn display_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
