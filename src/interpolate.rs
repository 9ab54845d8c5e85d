//! `{name}` placeholder substitution.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

/// A displayable parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Inserted verbatim.
    Text(String),
    /// Integers and floats, in JSON notation.
    Number(serde_json::Number),
    /// Booleans, null and containers, displayed as their JSON text.
    Other(Value),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Number(number) => Self::Number(number),
            other => Self::Other(other),
        }
    }
}

/// Placeholder name → value for one binding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterpolationParams(BTreeMap<String, ParamValue>);

impl InterpolationParams {
    /// No params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Parses a JSON object payload.
    ///
    /// Malformed JSON and non-object payloads yield empty params; the problem is
    /// logged and never propagated.
    #[must_use]
    pub fn from_json_lossy(payload: &str) -> Self {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Self::from_value_lossy(value),
            Err(error) => {
                tracing::warn!(payload, "Failed to parse i18n params: {error}");
                Self::default()
            }
        }
    }

    /// Takes the entries of a JSON object; any other value yields empty params.
    #[must_use]
    pub fn from_value_lossy(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Self(map.into_iter().map(|(name, value)| (name, value.into())).collect())
            }
            other => {
                tracing::warn!("Ignoring i18n params that are not an object: {other}");
                Self::default()
            }
        }
    }

    /// Value for placeholder `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Whether no placeholder has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for InterpolationParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}

/// Characters allowed in a placeholder name.
const fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces every `{name}` whose name is in `params`.
///
/// Names are one or more ASCII letters, digits or underscores. Unknown names
/// and anything that is not a well-formed placeholder are copied through
/// unchanged. Braces cannot be escaped or nested.
///
/// ```
/// use landing_i18n::interpolate::{interpolate, InterpolationParams};
///
/// let params = InterpolationParams::new().with("amount", 42_i64);
/// assert_eq!(interpolate("Save {amount}", &params), "Save 42");
/// assert_eq!(interpolate("Save {amount}", &InterpolationParams::new()), "Save {amount}");
/// ```
#[must_use]
pub fn interpolate<'a>(text: &'a str, params: &InterpolationParams) -> Cow<'a, str> {
    if params.is_empty() || !text.contains('{') {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some((before, after_open)) = rest.split_once('{') {
        output.push_str(before);

        let name_len =
            after_open.find(|c: char| !is_placeholder_char(c)).unwrap_or(after_open.len());
        let (name, tail) = after_open.split_at(name_len);

        match (name.is_empty(), tail.strip_prefix('}'), params.get(name)) {
            (false, Some(after_close), Some(value)) => {
                output.push_str(&value.to_string());
                rest = after_close;
            }
            _ => {
                // Not substitutable: keep the brace and rescan right after it.
                output.push('{');
                rest = after_open;
            }
        }
    }

    output.push_str(rest);
    Cow::Owned(output)
}
