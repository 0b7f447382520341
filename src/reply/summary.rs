//! One-line summary of agent run metadata.
//!
//! The decoded document is untrusted: every field is optional and a field
//! with an unexpected type is treated as absent instead of failing the
//! whole summary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Known metadata fields of an agent result document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunMetadata {
    #[serde(deserialize_with = "lenient")]
    duration_ms: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    duration_api_ms: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    num_turns: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    total_cost_usd: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    usage: Option<Usage>,
    #[serde(rename = "modelUsage", deserialize_with = "lenient")]
    model_usage: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    /// Per-tool call counters; non-numeric entries are skipped.
    #[serde(deserialize_with = "lenient")]
    server_tool_use: Option<Map<String, Value>>,
}

/// Deserialize a field, mapping a type mismatch to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Summarize a decoded result document as `key=value` pairs.
///
/// Returns `None` when the document is not an object or carries none of the
/// recognized fields.
///
/// ```
/// use cmdreply::reply::summarize_metadata;
/// use serde_json::json;
///
/// let doc = json!({"duration_ms": 1200, "num_turns": 3, "total_cost_usd": 0.01234});
/// assert_eq!(
///     summarize_metadata(&doc).as_deref(),
///     Some("duration=1200ms, turns=3, cost=$0.0123")
/// );
/// ```
pub fn summarize_metadata(decoded: &Value) -> Option<String> {
    if !decoded.is_object() {
        return None;
    }
    let meta: RunMetadata = serde_json::from_value(decoded.clone()).ok()?;
    let mut parts = Vec::new();

    if let Some(ms) = meta.duration_ms {
        parts.push(format!("duration={}ms", ms));
    }
    if let Some(ms) = meta.duration_api_ms {
        parts.push(format!("api={}ms", ms));
    }
    if let Some(turns) = meta.num_turns {
        parts.push(format!("turns={}", turns));
    }
    if let Some(cost) = meta.total_cost_usd {
        parts.push(format!("cost=${:.4}", cost));
    }

    if let Some(counters) = meta.usage.and_then(|u| u.server_tool_use) {
        let tool_calls: f64 = counters.values().filter_map(Value::as_f64).sum();
        if tool_calls > 0.0 {
            parts.push(format!("tool_calls={}", tool_calls));
        }
    }

    if let Some(models) = meta.model_usage {
        let names: Vec<&str> = models.keys().map(String::as_str).collect();
        if !names.is_empty() {
            parts.push(format!("models={}", format_models(&names)));
        }
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn format_models(names: &[&str]) -> String {
    if names.len() > 2 {
        format!("{}+{}", names[..2].join(","), names.len() - 2)
    } else {
        names.join(",")
    }
}
