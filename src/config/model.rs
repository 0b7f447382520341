//! Config struct definitions and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for one reply command, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Default number of reply commands allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Top-level contents of `cmdreply.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// How to build and run the reply command.
    pub reply: ReplyConfig,

    /// Admission control for concurrent reply commands.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Declarative description of how to build and run one reply command.
///
/// ```yaml
/// reply:
///   command: ["claude", "{{Body}}"]
///   template: "You are answering {{From}}."
///   claudeOutputFormat: json
///   mediaMaxMb: 5
///   session:
///     sendSystemOnce: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyConfig {
    /// Command template tokens; the first rendered token is the executable.
    pub command: Vec<String>,

    /// Optional prefix template inserted as the first argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Output format forced onto agent-tool invocations (e.g. `json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_output_format: Option<String>,

    /// Session continuity arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    /// Media attached when the command output names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// Local media files larger than this many megabytes are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_max_mb: Option<f64>,

    /// Working directory for the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Deadline after which the command is killed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl ReplyConfig {
    /// Build a config that only runs the given command tokens.
    pub fn with_command<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Effective command timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    /// Whether the prefix template is only sent on the first turn of a session.
    pub fn send_system_once(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.send_system_once)
    }

    /// Media size cap in bytes, if configured.
    pub fn media_max_bytes(&self) -> Option<u64> {
        self.media_max_mb
            .map(|mb| (mb * 1024.0 * 1024.0) as u64)
    }
}

/// Session continuity settings for the agent tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Send the prefix template only once per session.
    #[serde(default)]
    pub send_system_once: bool,

    /// Arguments used when a session starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_arg_new: Option<Vec<String>>,

    /// Arguments used when an existing session continues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_arg_resume: Option<Vec<String>>,

    /// Insert session arguments before the body (true) or append them (false).
    #[serde(default = "default_true")]
    pub session_arg_before_body: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_system_once: false,
            session_arg_new: None,
            session_arg_resume: None,
            session_arg_before_body: true,
        }
    }
}

impl SessionConfig {
    /// Argument templates for a new or resumed session.
    pub fn arg_templates(&self, is_new_session: bool) -> Vec<String> {
        if is_new_session {
            self.session_arg_new
                .clone()
                .unwrap_or_else(default_session_arg_new)
        } else {
            self.session_arg_resume
                .clone()
                .unwrap_or_else(default_session_arg_resume)
        }
    }
}

/// Queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

pub fn default_session_arg_new() -> Vec<String> {
    vec!["--session-id".to_string(), "{{SessionId}}".to_string()]
}

pub fn default_session_arg_resume() -> Vec<String> {
    vec!["--resume".to_string(), "{{SessionId}}".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}
