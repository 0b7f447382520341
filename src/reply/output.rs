//! Interpretation of the command's stdout.
//!
//! Agent-tool output (or any output declared as `json`) is decoded as
//! structured JSON to pull out the display text and a metadata summary.
//! Anything that fails to decode is used verbatim; a decode miss is an
//! expected path, not an error.

use crate::agent::STRUCTURED_OUTPUT_FORMAT;
use crate::reply::summary::summarize_metadata;
use serde_json::Value;
use tracing::debug;

/// Decoded structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutput {
    /// The decoded JSON document.
    pub parsed: Value,
    /// Display text extracted from the document, if any.
    pub text: Option<String>,
}

/// Working text for one reply plus what decoding learned about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpretedOutput {
    /// Trimmed display text (decoded text when available, else raw stdout).
    pub text: String,
    /// Decoded document, present only when decoding succeeded.
    pub structured: Option<StructuredOutput>,
}

impl InterpretedOutput {
    /// Metadata summary of the decoded document, if one was decoded.
    pub fn metadata_summary(&self) -> Option<String> {
        self.structured
            .as_ref()
            .and_then(|s| summarize_metadata(&s.parsed))
    }
}

/// Whether stdout should be decoded as structured output.
pub fn wants_structured_decode(output_format: Option<&str>, is_agent: bool) -> bool {
    output_format == Some(STRUCTURED_OUTPUT_FORMAT) || is_agent
}

/// Turn raw stdout into the working reply text.
pub fn interpret_output(stdout: &str, output_format: Option<&str>, is_agent: bool) -> InterpretedOutput {
    let raw = stdout.trim();
    if raw.is_empty() || !wants_structured_decode(output_format, is_agent) {
        return InterpretedOutput {
            text: raw.to_string(),
            structured: None,
        };
    }

    let Some(structured) = decode_structured_output(raw) else {
        debug!("Structured output decode failed; returning raw stdout");
        return InterpretedOutput {
            text: raw.to_string(),
            structured: None,
        };
    };

    if let Some(summary) = summarize_metadata(&structured.parsed) {
        debug!("Structured output meta: {}", summary);
    }
    debug!(
        "Structured output raw: {}",
        serde_json::to_string_pretty(&structured.parsed).unwrap_or_default()
    );

    // A whitespace-only text field still counts as the reply; it trims to "".
    let text = match structured.text.as_deref() {
        Some(text) if !text.is_empty() => {
            let text = text.trim();
            debug!("Structured output parsed -> {}", preview(text, 120));
            text.to_string()
        }
        _ => {
            debug!("Structured output carried no text; returning raw stdout");
            raw.to_string()
        }
    };

    InterpretedOutput {
        text,
        structured: Some(structured),
    }
}

/// Decode a JSON document, or the first JSON line of newline-delimited output.
pub fn decode_structured_output(text: &str) -> Option<StructuredOutput> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    std::iter::once(trimmed)
        .chain(trimmed.lines().map(str::trim).filter(|line| !line.is_empty()))
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .map(|parsed| StructuredOutput {
            text: extract_text(&parsed),
            parsed,
        })
}

/// Pull display text out of a decoded document.
fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(extract_text).collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        Value::Object(obj) => {
            for key in ["result", "text"] {
                if let Some(Value::String(s)) = obj.get(key) {
                    return Some(s.clone());
                }
            }
            if let Some(content) = obj.get("content") {
                let text = content_text(content);
                if text.is_some() {
                    return text;
                }
            }
            obj.get("message").and_then(|message| message.get("content")).and_then(content_text)
        }
        _ => None,
    }
}

/// Text of a `content` field: a string or a list of `{type: "text"}` blocks.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(blocks) => {
            let parts: Vec<&str> = blocks
                .iter()
                .filter(|block| {
                    block.get("type").and_then(Value::as_str).is_none_or(|t| t == "text")
                })
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        _ => None,
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
