//! Bindings between presentation elements and translation keys.

use std::fmt;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use thiserror::Error;

use crate::interpolate::InterpolationParams;

/// Opaque handle of a presentation element, e.g. a DOM id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Handle for `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw handle.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a resolved string reaches its element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Text content, escaped by the sink.
    #[default]
    Text,
    /// Raw markup. The translation source is trusted.
    Markup,
    /// A named attribute such as `placeholder`.
    Attribute(String),
}

/// One element ↔ key association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Target element.
    pub element: ElementId,
    /// Dotted translation key.
    pub key: String,
    /// Values for the translation's `{name}` placeholders.
    pub params: InterpolationParams,
    /// How the resolved string is applied.
    pub mode: RenderMode,
}

impl Binding {
    /// Text content binding.
    #[must_use]
    pub fn text(element: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_mode(element, key, RenderMode::Text)
    }

    /// Raw markup binding.
    #[must_use]
    pub fn markup(element: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_mode(element, key, RenderMode::Markup)
    }

    /// Binding to the `attribute` attribute of `element`.
    #[must_use]
    pub fn attribute(
        element: impl Into<String>,
        key: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self::with_mode(element, key, RenderMode::Attribute(attribute.into()))
    }

    /// Binding without params.
    fn with_mode(element: impl Into<String>, key: impl Into<String>, mode: RenderMode) -> Self {
        Self {
            element: ElementId::new(element),
            key: key.into(),
            params: InterpolationParams::default(),
            mode,
        }
    }

    /// Replaces the params.
    #[must_use]
    pub fn with_params(mut self, params: InterpolationParams) -> Self {
        self.params = params;
        self
    }

    /// Attaches a JSON-encoded params payload; malformed payloads mean no params.
    #[must_use]
    pub fn with_params_json(self, payload: &str) -> Self {
        self.with_params(InterpolationParams::from_json_lossy(payload))
    }
}

/// Supplies the full, current list of bindings on demand.
pub trait BindingSource {
    /// Every binding, in application order.
    fn bindings(&self) -> Vec<Binding>;
}

impl BindingSource for Vec<Binding> {
    fn bindings(&self) -> Vec<Binding> {
        self.clone()
    }
}

impl BindingSource for [Binding] {
    fn bindings(&self) -> Vec<Binding> {
        self.to_vec()
    }
}

/// Failure to load a bindings manifest.
#[derive(Error, Debug)]
pub enum BindingError {
    /// The manifest cannot be read.
    #[error("Failed to read bindings file: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid JSON or has an unknown shape.
    #[error("Failed to parse bindings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Params as written in a manifest: either an encoded JSON string (the form
/// markup attributes carry) or an inline JSON value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawParams {
    /// JSON text inside a string.
    Encoded(String),
    /// A JSON object written in place.
    Inline(Value),
}

impl From<RawParams> for InterpolationParams {
    fn from(raw: RawParams) -> Self {
        match raw {
            RawParams::Encoded(payload) => Self::from_json_lossy(&payload),
            RawParams::Inline(value) => Self::from_value_lossy(value),
        }
    }
}

/// One manifest entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindingEntry {
    /// Element handle.
    element: String,
    /// Translation key.
    key: String,
    /// Defaults to text.
    #[serde(default)]
    mode: RenderMode,
    /// Encoded or inline params.
    #[serde(default)]
    params: Option<RawParams>,
}

impl From<BindingEntry> for Binding {
    fn from(entry: BindingEntry) -> Self {
        Self {
            element: ElementId::new(entry.element),
            key: entry.key,
            params: entry.params.map(Into::into).unwrap_or_default(),
            mode: entry.mode,
        }
    }
}

/// Top level of a manifest file.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    /// Entries in application order.
    bindings: Vec<BindingEntry>,
}

/// Bindings declared in a JSON manifest.
///
/// ```json
/// { "bindings": [
///     { "element": "hero-subtitle", "key": "hero_subtitle", "params": "{\"count\": 500}" },
///     { "element": "email", "key": "email_placeholder", "mode": { "attribute": "placeholder" } }
/// ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindingManifest {
    /// Parsed bindings.
    bindings: Vec<Binding>,
}

impl BindingManifest {
    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    /// File read error or JSON parse error.
    pub fn load(path: &Path) -> Result<Self, BindingError> {
        tracing::debug!("Loading bindings from: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses manifest JSON.
    ///
    /// # Errors
    /// JSON parse error.
    pub fn from_json_str(text: &str) -> Result<Self, BindingError> {
        let file: ManifestFile = serde_json::from_str(text)?;
        Ok(Self { bindings: file.bindings.into_iter().map(Binding::from).collect() })
    }

    /// Number of bindings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the manifest declares no bindings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl BindingSource for BindingManifest {
    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }
}
