//! Rendering sink and an in-memory rendered document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::binding::ElementId;
use crate::locale::LocaleCode;

/// Receives resolved strings. Element handles are opaque to the engine.
pub trait RenderSink {
    /// Sets escaped text content.
    fn set_text(&mut self, element: &ElementId, text: &str);

    /// Sets raw, unescaped markup.
    fn set_markup(&mut self, element: &ElementId, markup: &str);

    /// Sets attribute `name`; other attributes are untouched.
    fn set_attribute(&mut self, element: &ElementId, name: &str, value: &str);

    /// Page title metadata.
    fn set_title(&mut self, title: &str);

    /// Description metadata.
    fn set_description(&mut self, description: &str);

    /// Document language marker (`<html lang>` and the `lang-*` body class).
    fn set_document_language(&mut self, locale: LocaleCode);
}

/// Content of one element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContent {
    /// Last text or markup set, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Attributes by name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Body of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Content {
    /// Plain text, escaped on output.
    Text(String),
    /// Trusted markup, emitted as-is.
    Markup(String),
}

impl Content {
    /// HTML for this content; text is escaped, markup is emitted as-is.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Text(text) => escape_html(text),
            Self::Markup(markup) => markup.clone(),
        }
    }
}

/// Escapes the characters that are significant in HTML text and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Records everything a sink receives. Used by the CLI and in tests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// Document language.
    pub language: Option<LocaleCode>,
    /// Page title.
    pub title: Option<String>,
    /// Description metadata.
    pub description: Option<String>,
    /// Every element that received content or attributes.
    pub elements: BTreeMap<ElementId, ElementContent>,
}

impl RenderedDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded for `element`.
    #[must_use]
    pub fn element(&self, element: &str) -> Option<&ElementContent> {
        self.elements.get(&ElementId::new(element))
    }

    /// Text or markup of `element`, unescaped.
    #[must_use]
    pub fn content_of(&self, element: &str) -> Option<&str> {
        match self.element(element)?.content.as_ref()? {
            Content::Text(value) | Content::Markup(value) => Some(value.as_str()),
        }
    }

    /// Attribute `name` of `element`.
    #[must_use]
    pub fn attribute_of(&self, element: &str, name: &str) -> Option<&str> {
        self.element(element)?.attributes.get(name).map(String::as_str)
    }

    /// The `lang-*` class the body carries for the current language.
    #[must_use]
    pub fn body_class(&self) -> Option<String> {
        self.language.map(|locale| format!("lang-{locale}"))
    }

    /// Record for `element`, created on first use.
    fn entry(&mut self, element: &ElementId) -> &mut ElementContent {
        self.elements.entry(element.clone()).or_default()
    }
}

impl RenderSink for RenderedDocument {
    fn set_text(&mut self, element: &ElementId, text: &str) {
        self.entry(element).content = Some(Content::Text(text.to_string()));
    }

    fn set_markup(&mut self, element: &ElementId, markup: &str) {
        self.entry(element).content = Some(Content::Markup(markup.to_string()));
    }

    fn set_attribute(&mut self, element: &ElementId, name: &str, value: &str) {
        self.entry(element).attributes.insert(name.to_string(), value.to_string());
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    fn set_document_language(&mut self, locale: LocaleCode) {
        self.language = Some(locale);
    }
}
