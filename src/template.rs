//! Template engine for `{{Key}}` substitution.
//!
//! Used to render the reply command tokens, the one-shot prefix template and
//! the session argument templates against the per-message context.
//!
//! # Syntax
//!
//! - `{{Key}}` or `{{ Key }}` - substitutes the value of `Key`
//! - a key missing from the context renders as the empty string
//! - anything that is not `{{` + word characters + `}}` is copied verbatim
//!
//! Rendering is total: there is no error path, so a malformed template
//! degrades to literal text rather than aborting a reply.

use std::collections::HashMap;

/// Well-known context keys populated by callers.
pub mod keys {
    pub const BODY: &str = "Body";
    pub const FROM: &str = "From";
    pub const TO: &str = "To";
    pub const MESSAGE_SID: &str = "MessageSid";
    pub const SESSION_ID: &str = "SessionId";
    pub const IS_NEW_SESSION: &str = "IsNewSession";
    pub const MEDIA_PATH: &str = "MediaPath";
    pub const MEDIA_URL: &str = "MediaUrl";
    pub const MEDIA_TYPE: &str = "MediaType";
}

/// Key/value substitutions available while rendering templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: HashMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a value, returning the context for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Render a template string against a context.
///
/// # Examples
///
/// ```
/// use cmdreply::template::{TemplateContext, render_template};
///
/// let ctx = TemplateContext::from_pairs([("Body", "hi there"), ("From", "+1555")]);
/// assert_eq!(render_template("{{From}}: {{ Body }}", &ctx), "+1555: hi there");
/// assert_eq!(render_template("[{{Missing}}]", &ctx), "[]");
/// ```
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            // No closing braces anywhere after this point
            result.push_str(&rest[open..]);
            return result;
        };

        let key = after_open[..close].trim();
        if is_placeholder_key(key) {
            result.push_str(ctx.get(key).unwrap_or(""));
            rest = &after_open[close + 2..];
        } else {
            // Not a placeholder; keep the braces and rescan after them
            result.push_str("{{");
            rest = after_open;
        }
    }

    result.push_str(rest);
    result
}

/// Render every token of a template sequence, preserving order.
pub fn render_all<S: AsRef<str>>(templates: &[S], ctx: &TemplateContext) -> Vec<String> {
    templates
        .iter()
        .map(|part| render_template(part.as_ref(), ctx))
        .collect()
}

fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}
