//! Recognition of the agent tool.
//!
//! The agent tool is the one executable (matched by basename) that receives
//! output-format flag injection and identity framing of its final argument.

use std::path::Path;

/// Basename of the recognized agent executable.
pub const AGENT_BIN: &str = "claude";

/// Framing prepended to the body handed to the agent tool.
pub const AGENT_IDENTITY_PREFIX: &str = "You are replying to a chat message relayed to you by an \
auto-reply bridge. Answer the sender directly and keep the reply short enough to read on a phone. \
To attach a file or image, put MEDIA:<absolute path or https URL> on its own line.";

/// Output format identifier that marks stdout as structured JSON.
pub const STRUCTURED_OUTPUT_FORMAT: &str = "json";

/// Whether `executable` resolves to the agent tool.
pub fn is_agent_bin(executable: &str) -> bool {
    Path::new(executable)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == AGENT_BIN)
}

/// Whether `argv` invokes the agent tool.
pub fn is_agent_invocation<S: AsRef<str>>(argv: &[S]) -> bool {
    argv.first().is_some_and(|exe| is_agent_bin(exe.as_ref()))
}
