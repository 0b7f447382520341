//! Implementation of the `cmdreply summarize` command.

use crate::cli::SummarizeArgs;
use crate::error::{ReplyError, Result};
use crate::reply::{decode_structured_output, summarize_metadata};

/// Printed when the document has no recognized metadata.
const NO_METADATA: &str = "(no metadata)";

/// Execute the `cmdreply summarize` command.
pub fn cmd_summarize(args: SummarizeArgs) -> Result<()> {
    let content = if args.file == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| ReplyError::Io(format!("failed to read stdin: {}", e)))?
    } else {
        std::fs::read_to_string(&args.file)
            .map_err(|e| ReplyError::Io(format!("failed to read '{}': {}", args.file, e)))?
    };

    println!("{}", summary_line(&content)?);
    Ok(())
}

fn summary_line(content: &str) -> Result<String> {
    let decoded = decode_structured_output(content).ok_or_else(|| {
        ReplyError::UserError("input is not a JSON document or JSON lines".to_string())
    })?;
    Ok(summarize_metadata(&decoded.parsed).unwrap_or_else(|| NO_METADATA.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_with_metadata() {
        let line = summary_line(r#"{"result":"x","duration_ms":10,"total_cost_usd":0.5}"#).unwrap();
        assert_eq!(line, "duration=10ms, cost=$0.5000");
    }

    #[test]
    fn test_summary_line_without_metadata() {
        assert_eq!(summary_line(r#"{"result":"x"}"#).unwrap(), NO_METADATA);
    }

    #[test]
    fn test_summary_line_rejects_non_json() {
        let err = summary_line("plain text").unwrap_err();
        assert!(matches!(err, ReplyError::UserError(_)));
    }
}
