//! Applies translations to bound elements.

use std::sync::Arc;

use crate::binding::{
    Binding,
    RenderMode,
};
use crate::interpolate::interpolate;
use crate::locale::LocaleCode;
use crate::render::RenderSink;
use crate::store::TranslationCatalog;

/// Key routed to the page title.
pub const TITLE_KEY: &str = "title";

/// Key routed to the description metadata.
pub const DESCRIPTION_KEY: &str = "description";

/// The active locale, passed explicitly to every synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalizationContext {
    /// Locale every lookup resolves against.
    pub active: LocaleCode,
}

impl LocalizationContext {
    /// Context with `active` as the active locale.
    #[must_use]
    pub const fn new(active: LocaleCode) -> Self {
        Self { active }
    }
}

/// Resolves, interpolates and dispatches every binding.
#[derive(Debug, Clone)]
pub struct TextSynchronizer {
    /// Translations shared with the engine.
    catalog: Arc<TranslationCatalog>,
}

impl TextSynchronizer {
    /// Synchronizer over `catalog`.
    #[must_use]
    pub const fn new(catalog: Arc<TranslationCatalog>) -> Self {
        Self { catalog }
    }

    /// Translations in use.
    #[must_use]
    pub fn catalog(&self) -> &TranslationCatalog {
        &self.catalog
    }

    /// Full pass over `bindings` and the document metadata.
    ///
    /// Returns how many bindings received content. Bindings whose key is
    /// missing from both the active and the default table are left alone.
    pub fn apply(&self, context: &LocalizationContext, bindings: &[Binding], sink: &mut dyn RenderSink) -> usize {
        let applied = bindings.iter().filter(|binding| self.apply_binding(context, binding, sink)).count();
        self.apply_metadata(context, sink);

        tracing::debug!(
            locale = %context.active,
            applied,
            skipped = bindings.len() - applied,
            "Synchronized bindings"
        );
        applied
    }

    /// The resolved and interpolated text for one binding.
    #[must_use]
    pub fn render_text(&self, context: &LocalizationContext, binding: &Binding) -> Option<String> {
        let translation = self.catalog.resolve(context.active, &binding.key)?;
        Some(interpolate(translation, &binding.params).into_owned())
    }

    /// Pushes one binding to `sink`. Returns whether it had a translation.
    fn apply_binding(&self, context: &LocalizationContext, binding: &Binding, sink: &mut dyn RenderSink) -> bool {
        let Some(text) = self.render_text(context, binding) else {
            tracing::debug!(key = binding.key, element = %binding.element, "No translation, element left unchanged");
            return false;
        };

        match &binding.mode {
            RenderMode::Text => sink.set_text(&binding.element, &text),
            RenderMode::Markup => sink.set_markup(&binding.element, &text),
            RenderMode::Attribute(name) => sink.set_attribute(&binding.element, name, &text),
        }
        true
    }

    /// Title and description, when translated.
    fn apply_metadata(&self, context: &LocalizationContext, sink: &mut dyn RenderSink) {
        if let Some(title) = self.catalog.resolve(context.active, TITLE_KEY) {
            sink.set_title(title);
        }
        if let Some(description) = self.catalog.resolve(context.active, DESCRIPTION_KEY) {
            sink.set_description(description);
        }
    }
}
