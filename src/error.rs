//! Error types for cmdreply.
//!
//! Only the surfaces around the pipeline are fallible (config loading, CLI
//! input parsing). `run_command_reply` itself never returns an error: every
//! failure of the external command is folded into the reply metadata.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for cmdreply operations.
#[derive(Error, Debug)]
pub enum ReplyError {
    /// Reply configuration is missing, unparsable, or fails validation.
    #[error("{0}")]
    Config(String),

    /// User provided invalid arguments.
    #[error("{0}")]
    UserError(String),

    /// Reading an input or writing output failed.
    #[error("I/O failure: {0}")]
    Io(String),
}

impl ReplyError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplyError::Config(_) => exit_codes::CONFIG_ERROR,
            ReplyError::UserError(_) => exit_codes::USER_ERROR,
            ReplyError::Io(_) => exit_codes::IO_ERROR,
        }
    }
}

/// Result type alias for cmdreply operations.
pub type Result<T> = std::result::Result<T, ReplyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = ReplyError::Config("empty command".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = ReplyError::UserError("bad --var".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn io_error_has_correct_exit_code() {
        let err = ReplyError::Io("stdin closed".to_string());
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ReplyError::Io("cannot read meta.json".to_string());
        assert_eq!(err.to_string(), "I/O failure: cannot read meta.json");

        let err = ReplyError::Config("reply.command must not be empty".to_string());
        assert_eq!(err.to_string(), "reply.command must not be empty");
    }
}
