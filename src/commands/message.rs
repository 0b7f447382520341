//! Shared setup for commands that act on one inbound message.

use crate::cli::MessageArgs;
use crate::config::{ConfigFile, ReplyConfig};
use crate::error::{ReplyError, Result};
use crate::reply::{CommandReplyParams, TurnState};
use crate::template::{TemplateContext, keys};
use std::time::Duration;

/// Everything needed to build or run the reply for one message.
#[derive(Debug)]
pub(super) struct PreparedMessage {
    pub config: ConfigFile,
    pub ctx: TemplateContext,
    pub turn: TurnState,
    pub timeout: Duration,
}

impl PreparedMessage {
    /// Load the config and assemble the templating context and turn state.
    pub fn from_args(args: &MessageArgs) -> Result<Self> {
        let config = ConfigFile::load(&args.config)?.ok_or_else(|| {
            ReplyError::Config(format!(
                "config file '{}' not found.\n\n\
                 Pass --config or create it with a `reply.command` entry.",
                args.config.display()
            ))
        })?;

        let timeout = match args.timeout_seconds {
            Some(0) => {
                return Err(ReplyError::UserError(
                    "--timeout-seconds must be positive".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => config.reply.timeout(),
        };

        let turn = TurnState {
            send_system_once: config.reply.send_system_once(),
            is_new_session: args.new_session,
            is_first_turn_in_session: args.first_turn,
            system_sent: args.system_sent,
        };

        Ok(Self {
            ctx: message_context(args),
            config,
            turn,
            timeout,
        })
    }

    pub fn reply(&self) -> &ReplyConfig {
        &self.config.reply
    }

    pub fn params(&self) -> CommandReplyParams<'_> {
        CommandReplyParams::new(&self.config.reply, &self.ctx, self.turn).with_timeout(self.timeout)
    }
}

/// Templating context for the message; named flags win over `--var`.
fn message_context(args: &MessageArgs) -> TemplateContext {
    let mut ctx = TemplateContext::from_pairs(args.vars.iter().cloned());
    ctx.insert(keys::BODY, args.body.as_str());
    let optional = [
        (keys::FROM, &args.from),
        (keys::TO, &args.to),
        (keys::MESSAGE_SID, &args.message_sid),
        (keys::SESSION_ID, &args.session_id),
        (keys::MEDIA_PATH, &args.media_path),
        (keys::MEDIA_URL, &args.media_url),
        (keys::MEDIA_TYPE, &args.media_type),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            ctx.insert(key, value.as_str());
        }
    }
    ctx.insert(keys::IS_NEW_SESSION, args.new_session.to_string());
    ctx
}
