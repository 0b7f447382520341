//! Exit code constants for the cmdreply CLI.
//!
//! - 0: Success (the pipeline ran, whatever its outcome)
//! - 1: User error (bad arguments)
//! - 2: Configuration error (missing or invalid reply config)
//! - 3: I/O failure (unreadable input file, stdout write failure)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or malformed `--var` pairs.
pub const USER_ERROR: i32 = 1;

/// Configuration error: config file missing, unparsable, or invalid.
pub const CONFIG_ERROR: i32 = 2;

/// I/O failure outside the pipeline itself.
pub const IO_ERROR: i32 = 3;
