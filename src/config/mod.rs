//! Reply configuration for cmdreply.
//!
//! This module defines the `cmdreply.yaml` model: how the reply command is
//! built (command tokens, prefix template, session arguments), how it runs
//! (working directory, timeout, queue width) and how its media is filtered.
//! Unknown fields are ignored for forward compatibility.

mod model;
mod operations;


// Re-export public API
pub use model::{
    ConfigFile, DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT_SECONDS, QueueConfig, ReplyConfig,
    SessionConfig, default_session_arg_new, default_session_arg_resume,
};
