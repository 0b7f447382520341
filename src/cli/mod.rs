//! CLI argument parsing for cmdreply.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "cmdreply.yaml";

/// cmdreply: run an agent CLI for one inbound message and normalize its reply.
///
/// The reply command, optional prefix template, session arguments and media
/// limits come from a YAML config file.
#[derive(Parser, Debug)]
#[command(name = "cmdreply")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log the full pipeline trace to stderr (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cmdreply.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the reply command for one message.
    ///
    /// Prints the reply payload and execution metadata as JSON.
    Run(MessageArgs),

    /// Print the argv that `run` would execute, without running it.
    Argv(MessageArgs),

    /// Summarize the metadata of a structured-output JSON document.
    ///
    /// Reads FILE, or stdin when FILE is `-`.
    Summarize(SummarizeArgs),
}

/// Inputs describing one inbound message and its session turn.
#[derive(Args, Debug, Clone)]
pub struct MessageArgs {
    /// Path to the YAML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Message body.
    #[arg(short, long)]
    pub body: String,

    /// Sender identifier.
    #[arg(long)]
    pub from: Option<String>,

    /// Recipient identifier.
    #[arg(long)]
    pub to: Option<String>,

    /// Platform message identifier.
    #[arg(long)]
    pub message_sid: Option<String>,

    /// Local path of media attached to the inbound message.
    #[arg(long)]
    pub media_path: Option<String>,

    /// URL of media attached to the inbound message.
    #[arg(long)]
    pub media_url: Option<String>,

    /// MIME type of the attached media.
    #[arg(long)]
    pub media_type: Option<String>,

    /// Session identifier used by the session argument templates.
    #[arg(long)]
    pub session_id: Option<String>,

    /// This message starts a new session.
    #[arg(long)]
    pub new_session: bool,

    /// This is the first turn of the session.
    #[arg(long)]
    pub first_turn: bool,

    /// The prefix template was already sent in this session.
    #[arg(long)]
    pub system_sent: bool,

    /// Override the configured timeout, in seconds.
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Extra template variables (repeatable).
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

/// Arguments for the `summarize` command.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// JSON file to read, or `-` for stdin.
    pub file: String,
}

/// Parse a `KEY=VALUE` template variable.
fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("invalid template key '{}'", key));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_minimal() {
        let cli = Cli::try_parse_from(["cmdreply", "run", "--body", "hello"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.body, "hello");
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(!args.new_session);
        assert!(args.vars.is_empty());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_run_full() {
        let cli = Cli::try_parse_from([
            "cmdreply",
            "run",
            "--config",
            "/etc/reply.yaml",
            "--body",
            "hi",
            "--from",
            "+15550001",
            "--to",
            "+15550002",
            "--message-sid",
            "SM123",
            "--media-url",
            "https://example.com/in.jpg",
            "--session-id",
            "abc",
            "--new-session",
            "--first-turn",
            "--system-sent",
            "--timeout-seconds",
            "30",
            "--var",
            "MediaPath=/tmp/a.jpg",
            "--var",
            "Note=a=b",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.config, PathBuf::from("/etc/reply.yaml"));
        assert_eq!(args.from.as_deref(), Some("+15550001"));
        assert_eq!(args.to.as_deref(), Some("+15550002"));
        assert_eq!(args.message_sid.as_deref(), Some("SM123"));
        assert_eq!(args.media_url.as_deref(), Some("https://example.com/in.jpg"));
        assert_eq!(args.media_path, None);
        assert_eq!(args.session_id.as_deref(), Some("abc"));
        assert!(args.new_session && args.first_turn && args.system_sent);
        assert_eq!(args.timeout_seconds, Some(30));
        assert_eq!(
            args.vars,
            vec![
                ("MediaPath".to_string(), "/tmp/a.jpg".to_string()),
                ("Note".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_run_requires_body() {
        assert!(Cli::try_parse_from(["cmdreply", "run"]).is_err());
    }

    #[test]
    fn parse_bad_var_rejected() {
        assert!(Cli::try_parse_from(["cmdreply", "argv", "-b", "x", "--var", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["cmdreply", "argv", "-b", "x", "--var", "a b=1"]).is_err());
    }

    #[test]
    fn parse_summarize_stdin() {
        let cli = Cli::try_parse_from(["cmdreply", "summarize", "-"]).unwrap();
        let Command::Summarize(args) = cli.command else {
            panic!("Expected Summarize command");
        };
        assert_eq!(args.file, "-");
    }

    #[test]
    fn parse_var_values() {
        assert_eq!(
            parse_var("Key=").unwrap(),
            ("Key".to_string(), String::new())
        );
        assert!(parse_var("=value").is_err());
    }
}
