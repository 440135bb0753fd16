//! Report: a mismatch as shown to callers
//!
//! Counts are dropped and validator messages unwrapped. `Display` renders
//! field maps as indented JSON with bare keys:
//!
//! ```text
//! {
//!   age: "should be of type number",
//!   extra: "this field is not allowed"
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static QUOTED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)":"#).expect("quoted key regex"));

/// Stands in for escaped quotes while keys are unquoted.
const ESCAPED_QUOTE_PLACEHOLDER: char = '\u{FFFF}';

/// A cleaned mismatch: a message, or messages keyed by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// Single failure message.
    Message(String),
    /// Failures keyed by field name, in scan order.
    Fields(IndexMap<String, Report>),
}

impl Report {
    /// Report recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Report> {
        match self {
            Self::Fields(fields) => fields.get(field),
            Self::Message(_) => None,
        }
    }

    /// The message, if this is not a field map.
    #[must_use]
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(message) => Some(message),
            Self::Fields(_) => None,
        }
    }

    /// JSON form: strings for messages, objects for field maps.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Message(message) => serde_json::Value::String(message.clone()),
            Self::Fields(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, report)| (name.clone(), report.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Fields(_) => {
                let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
                let protected = json.replace("\\\"", &ESCAPED_QUOTE_PLACEHOLDER.to_string());
                let unquoted = QUOTED_KEY.replace_all(&protected, "$1:");
                f.write_str(&unquoted.replace(ESCAPED_QUOTE_PLACEHOLDER, "\\\""))
            }
        }
    }
}
