//! Config loading and validation.

use super::model::ConfigFile;
use crate::error::{ReplyError, Result};
use std::path::Path;

impl ConfigFile {
    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ReplyError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map(Some)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ConfigFile = serde_yaml::from_str(yaml)
            .map_err(|e| ReplyError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ReplyError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `reply.command` must contain at least one non-empty token
    /// - `reply.timeoutSeconds` must be positive when set
    /// - `reply.mediaMaxMb` must be a positive number when set
    /// - `queue.maxConcurrent` must be positive
    pub fn validate(&self) -> Result<()> {
        let reply = &self.reply;

        if reply.command.is_empty() {
            return Err(ReplyError::Config(
                "config validation failed: reply.command must not be empty".to_string(),
            ));
        }

        if reply.command[0].trim().is_empty() {
            return Err(ReplyError::Config(
                "config validation failed: reply.command[0] must name an executable".to_string(),
            ));
        }

        if reply.timeout_seconds == Some(0) {
            return Err(ReplyError::Config(
                "config validation failed: reply.timeoutSeconds must be greater than 0"
                    .to_string(),
            ));
        }

        if let Some(mb) = reply.media_max_mb
            && !(mb.is_finite() && mb > 0.0)
        {
            return Err(ReplyError::Config(format!(
                "config validation failed: reply.mediaMaxMb must be a positive number (found {})",
                mb
            )));
        }

        if self.queue.max_concurrent == 0 {
            return Err(ReplyError::Config(
                "config validation failed: queue.maxConcurrent must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
