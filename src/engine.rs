//! Bootstrap, locale application and switching.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;

use crate::binding::BindingSource;
use crate::locale::LocaleCode;
use crate::preference::{
    MemoryStore,
    PreferenceStore,
};
use crate::render::RenderSink;
use crate::resolver::geo::{
    DisabledLocator,
    GeoLocator,
};
use crate::resolver::hint::{
    LanguageHint,
    StaticLanguageHint,
};
use crate::resolver::{
    LocaleResolver,
    ResolverSettings,
};
use crate::store::TranslationCatalog;
use crate::sync::{
    LocalizationContext,
    TextSynchronizer,
};
use crate::telemetry::{
    NoopTelemetry,
    TelemetryEvent,
    TelemetrySink,
};

/// Key prefix of the language switcher labels.
const LANGUAGE_LABEL_PREFIX: &str = "languages";

/// One entry of the language switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    /// Locale the entry switches to.
    pub locale: LocaleCode,
    /// Label in the active locale.
    pub label: String,
    /// Whether this is the active locale.
    pub active: bool,
}

/// Owns the active locale and drives every synchronization pass.
pub struct LocalizationEngine {
    /// Initial locale detection.
    resolver: LocaleResolver,
    /// Pushes resolved strings to bindings.
    synchronizer: TextSynchronizer,
    /// Where the applied locale is saved.
    store: Arc<dyn PreferenceStore>,
    /// Receives `language_applied` and `language_switched`.
    telemetry: Arc<dyn TelemetrySink>,
    /// Active locale.
    context: LocalizationContext,
}

impl std::fmt::Debug for LocalizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationEngine")
            .field("resolver", &self.resolver)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl LocalizationEngine {
    /// Starts wiring an engine over `catalog`.
    #[must_use]
    pub fn builder(catalog: Arc<TranslationCatalog>) -> EngineBuilder {
        EngineBuilder::new(catalog)
    }

    /// Active locale; `en` until bootstrap.
    #[must_use]
    pub const fn current_locale(&self) -> LocaleCode {
        self.context.active
    }

    /// Active localization context.
    #[must_use]
    pub const fn context(&self) -> &LocalizationContext {
        &self.context
    }

    /// Resolver used by [`Self::bootstrap`].
    #[must_use]
    pub const fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Whether Traditional Chinese is active.
    #[must_use]
    pub fn is_chinese(&self) -> bool {
        self.context.active == LocaleCode::ZhTw
    }

    /// Resolves the initial locale and performs the first full pass.
    ///
    /// Never fails. A panic inside resolution is caught and the default
    /// locale is applied instead.
    pub async fn bootstrap(&mut self, bindings: &dyn BindingSource, sink: &mut dyn RenderSink) -> LocaleCode {
        let locale = match AssertUnwindSafe(self.resolver.resolve()).catch_unwind().await {
            Ok(locale) => locale,
            Err(_) => {
                tracing::error!("Locale resolution panicked; falling back to '{}'", LocaleCode::DEFAULT);
                LocaleCode::DEFAULT
            }
        };

        self.apply_locale(locale, bindings, sink);
        locale
    }

    /// Makes `locale` active, re-renders everything and persists the choice.
    ///
    /// Returns the number of bindings that received content.
    pub fn apply_locale(
        &mut self,
        locale: LocaleCode,
        bindings: &dyn BindingSource,
        sink: &mut dyn RenderSink,
    ) -> usize {
        let started = Instant::now();
        self.context.active = locale;

        sink.set_document_language(locale);
        let applied = self.synchronizer.apply(&self.context, &bindings.bindings(), sink);
        self.persist(locale);

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        TelemetryEvent::LanguageApplied { locale, elapsed_ms }.emit(self.telemetry.as_ref());
        applied
    }

    /// Switches to `requested`, coercing unsupported codes to the default.
    ///
    /// Returns `false` when the locale was already active; nothing is
    /// re-rendered or reported in that case.
    pub fn switch_locale(
        &mut self,
        requested: &str,
        bindings: &dyn BindingSource,
        sink: &mut dyn RenderSink,
    ) -> bool {
        let from = self.context.active;
        let to = LocaleCode::coerce(requested);
        if from == to {
            tracing::debug!(locale = %to, "Locale already active");
            return false;
        }

        TelemetryEvent::LanguageSwitched { from, to }.emit(self.telemetry.as_ref());
        self.apply_locale(to, bindings, sink);
        true
    }

    /// Switcher entries labelled in the active locale.
    #[must_use]
    pub fn language_options(&self) -> Vec<LanguageOption> {
        LocaleCode::ALL
            .into_iter()
            .map(|locale| {
                let key = format!("{LANGUAGE_LABEL_PREFIX}.{locale}");
                let label = self
                    .synchronizer
                    .catalog()
                    .resolve(self.context.active, &key)
                    .map_or_else(|| locale.to_string(), ToString::to_string);
                LanguageOption { locale, label, active: locale == self.context.active }
            })
            .collect()
    }

    /// Saves `locale`; failures are logged and otherwise ignored.
    fn persist(&self, locale: LocaleCode) {
        let key = &self.resolver.settings().storage_key;
        if let Err(error) = self.store.set(key, locale.as_str()) {
            tracing::warn!("Failed to save language preference: {}", error);
        }
    }
}

/// Wires the collaborators of a [`LocalizationEngine`].
///
/// Unset collaborators default to session-only storage, no geolocation, no
/// language hint and no telemetry.
pub struct EngineBuilder {
    /// Translations to render.
    catalog: Arc<TranslationCatalog>,
    /// Resolver tunables.
    settings: ResolverSettings,
    /// Preference storage.
    store: Arc<dyn PreferenceStore>,
    /// Country lookup.
    geo: Arc<dyn GeoLocator>,
    /// Host language list.
    hint: Arc<dyn LanguageHint>,
    /// Analytics sink.
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl EngineBuilder {
    /// Builder with every collaborator at its default.
    fn new(catalog: Arc<TranslationCatalog>) -> Self {
        Self {
            catalog,
            settings: ResolverSettings::default(),
            store: Arc::new(MemoryStore::new()),
            geo: Arc::new(DisabledLocator),
            hint: Arc::new(StaticLanguageHint::default()),
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    /// Storage key and geolocation timeout.
    #[must_use]
    pub fn settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Preference storage.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.store = store;
        self
    }

    /// Country lookup.
    #[must_use]
    pub fn geolocator(mut self, geo: Arc<dyn GeoLocator>) -> Self {
        self.geo = geo;
        self
    }

    /// Host language list.
    #[must_use]
    pub fn language_hint(mut self, hint: Arc<dyn LanguageHint>) -> Self {
        self.hint = hint;
        self
    }

    /// Analytics sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The engine, not yet bootstrapped.
    #[must_use]
    pub fn build(self) -> LocalizationEngine {
        let resolver = LocaleResolver::new(
            self.settings,
            self.store.clone(),
            self.geo,
            self.hint,
            self.telemetry.clone(),
        );
        LocalizationEngine {
            resolver,
            synchronizer: TextSynchronizer::new(self.catalog),
            store: self.store,
            telemetry: self.telemetry,
            context: LocalizationContext::default(),
        }
    }
}
