//! Initial locale detection.
//!
//! Strategies run in a fixed order and the first one that produces a locale
//! wins. The outcome is computed once per resolver; concurrent callers share
//! the in-flight computation.

pub mod geo;
pub mod hint;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::locale::{
    LocaleCode,
    is_traditional_chinese_tag,
};
use crate::preference::PreferenceStore;
use crate::telemetry::{
    TelemetryEvent,
    TelemetrySink,
};
use geo::GeoLocator;
use hint::LanguageHint;

/// Storage key holding the user's explicit choice.
pub const DEFAULT_STORAGE_KEY: &str = "adsopti_language";

/// Upper bound for the geolocation lookup.
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_millis(3000);

/// Country whose visitors get Traditional Chinese.
const TRADITIONAL_CHINESE_COUNTRY: &str = "TW";

/// Country name reported with geolocation detections.
const TRADITIONAL_CHINESE_COUNTRY_NAME: &str = "Taiwan";

/// How a locale was chosen. Also the strategy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionMethod {
    /// The user's persisted choice.
    StoredPreference,
    /// Country lookup by client IP.
    IpGeolocation,
    /// Host language list.
    BrowserLanguage,
    /// Nothing matched.
    Default,
}

impl ResolutionMethod {
    /// Strategy evaluation order.
    pub const ORDER: [Self; 4] =
        [Self::StoredPreference, Self::IpGeolocation, Self::BrowserLanguage, Self::Default];

    /// Name used in telemetry and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StoredPreference => "stored_preference",
            Self::IpGeolocation => "ip_geolocation",
            Self::BrowserLanguage => "browser_language",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The strategy produced a locale.
    Success(LocaleCode, ResolutionMethod),
    /// No signal; try the next strategy.
    Skip,
}

/// The winning locale and the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Chosen locale.
    pub locale: LocaleCode,
    /// Strategy that chose it.
    pub method: ResolutionMethod,
}

/// Tunables for [`LocaleResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Preference key holding the stored locale.
    pub storage_key: String,
    /// Upper bound for the geolocation strategy.
    pub geolocation_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
        }
    }
}

/// Determines the initial locale.
///
/// Every strategy is best-effort: storage errors, network failures and
/// timeouts all degrade to the next strategy. `resolve` always returns a
/// supported locale.
pub struct LocaleResolver {
    /// Storage key and timeout.
    settings: ResolverSettings,
    /// Source of the stored preference.
    store: Arc<dyn PreferenceStore>,
    /// Country lookup.
    geo: Arc<dyn GeoLocator>,
    /// Host language list.
    hint: Arc<dyn LanguageHint>,
    /// Receives `language_auto_detected`.
    telemetry: Arc<dyn TelemetrySink>,
    /// Memoized outcome, shared by concurrent callers.
    resolution: OnceCell<Resolution>,
}

impl std::fmt::Debug for LocaleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleResolver")
            .field("settings", &self.settings)
            .field("resolution", &self.resolution.get())
            .finish_non_exhaustive()
    }
}

impl LocaleResolver {
    /// A resolver that has not run yet.
    #[must_use]
    pub fn new(
        settings: ResolverSettings,
        store: Arc<dyn PreferenceStore>,
        geo: Arc<dyn GeoLocator>,
        hint: Arc<dyn LanguageHint>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self { settings, store, geo, hint, telemetry, resolution: OnceCell::new() }
    }

    /// Settings the resolver was built with.
    #[must_use]
    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// The initial locale.
    pub async fn resolve(&self) -> LocaleCode {
        self.resolution().await.locale
    }

    /// The initial locale and how it was chosen. Strategies run at most once.
    pub async fn resolution(&self) -> Resolution {
        *self.resolution.get_or_init(|| self.run_strategies()).await
    }

    /// The memoized resolution, if one has completed.
    #[must_use]
    pub fn last_resolution(&self) -> Option<Resolution> {
        self.resolution.get().copied()
    }

    /// Evaluates strategies in order until one succeeds.
    async fn run_strategies(&self) -> Resolution {
        for method in ResolutionMethod::ORDER {
            if let StrategyOutcome::Success(locale, method) = self.attempt(method).await {
                tracing::info!(locale = %locale, method = %method, "Locale resolved");
                return Resolution { locale, method };
            }
        }
        Resolution { locale: LocaleCode::DEFAULT, method: ResolutionMethod::Default }
    }

    /// Runs one strategy.
    pub async fn attempt(&self, method: ResolutionMethod) -> StrategyOutcome {
        match method {
            ResolutionMethod::StoredPreference => self.stored_preference(),
            ResolutionMethod::IpGeolocation => self.ip_geolocation().await,
            ResolutionMethod::BrowserLanguage => self.browser_language(),
            ResolutionMethod::Default => self.fallback(),
        }
    }

    /// A supported locale previously saved under the storage key.
    fn stored_preference(&self) -> StrategyOutcome {
        let stored = match self.store.get(&self.settings.storage_key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return StrategyOutcome::Skip,
            Err(error) => {
                tracing::warn!("Failed to read stored language preference: {}", error);
                return StrategyOutcome::Skip;
            }
        };

        match stored.parse::<LocaleCode>() {
            Ok(locale) => StrategyOutcome::Success(locale, ResolutionMethod::StoredPreference),
            Err(error) => {
                tracing::debug!("Ignoring stored preference: {}", error);
                StrategyOutcome::Skip
            }
        }
    }

    /// `zh-TW` when the client IP is located in Taiwan.
    async fn ip_geolocation(&self) -> StrategyOutcome {
        let timeout = self.settings.geolocation_timeout;
        let country = match tokio::time::timeout(timeout, self.geo.country_code()).await {
            Ok(Ok(country)) => country,
            Ok(Err(error)) => {
                tracing::warn!("IP geolocation failed: {}", error);
                return StrategyOutcome::Skip;
            }
            Err(_) => {
                tracing::warn!("IP geolocation failed: {}", geo::GeoError::Timeout(timeout));
                return StrategyOutcome::Skip;
            }
        };

        if country != TRADITIONAL_CHINESE_COUNTRY {
            tracing::debug!(country = %country, "Country does not map to a locale");
            return StrategyOutcome::Skip;
        }

        TelemetryEvent::LanguageDetected {
            method: ResolutionMethod::IpGeolocation,
            locale: LocaleCode::ZhTw,
            country: Some(TRADITIONAL_CHINESE_COUNTRY_NAME.to_string()),
            browser_language: None,
        }
        .emit(self.telemetry.as_ref());
        StrategyOutcome::Success(LocaleCode::ZhTw, ResolutionMethod::IpGeolocation)
    }

    /// `zh-TW` when the primary host language is Traditional Chinese.
    fn browser_language(&self) -> StrategyOutcome {
        let Some(primary) = self.hint.primary() else {
            return StrategyOutcome::Skip;
        };
        if !is_traditional_chinese_tag(&primary) {
            return StrategyOutcome::Skip;
        }

        TelemetryEvent::LanguageDetected {
            method: ResolutionMethod::BrowserLanguage,
            locale: LocaleCode::ZhTw,
            country: None,
            browser_language: Some(primary),
        }
        .emit(self.telemetry.as_ref());
        StrategyOutcome::Success(LocaleCode::ZhTw, ResolutionMethod::BrowserLanguage)
    }

    /// Always succeeds with the default locale.
    fn fallback(&self) -> StrategyOutcome {
        TelemetryEvent::LanguageDetected {
            method: ResolutionMethod::Default,
            locale: LocaleCode::DEFAULT,
            country: None,
            browser_language: self.hint.primary(),
        }
        .emit(self.telemetry.as_ref());
        StrategyOutcome::Success(LocaleCode::DEFAULT, ResolutionMethod::Default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::preference::{
        MemoryStore,
        PreferenceStore,
        StorageError,
    };
    use crate::test_utils::{
        StubLocator,
        StubReply,
        resolver_fixture,
    };

    /// Fails every read and write.
    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk unavailable")))
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk unavailable")))
        }
    }

    #[tokio::test]
    async fn stored_preference_wins_without_network() {
        let fixture =
            resolver_fixture(MemoryStore::with(DEFAULT_STORAGE_KEY, "zh-TW"), StubLocator::country("US"), &["en-US"]);

        let resolution = fixture.resolver.resolution().await;

        assert_that!(resolution.locale, eq(LocaleCode::ZhTw));
        assert_that!(resolution.method, eq(ResolutionMethod::StoredPreference));
        assert_that!(fixture.locator.calls(), eq(0));
        assert_that!(fixture.telemetry.events(), is_empty());
    }

    #[rstest]
    #[case("zh-tw")]
    #[case("fr")]
    #[case("")]
    #[tokio::test]
    async fn unsupported_stored_value_is_ignored(#[case] stored: &str) {
        let fixture =
            resolver_fixture(MemoryStore::with(DEFAULT_STORAGE_KEY, stored), StubLocator::country("TW"), &[]);

        let resolution = fixture.resolver.resolution().await;

        assert_that!(resolution.method, eq(ResolutionMethod::IpGeolocation));
        assert_that!(fixture.locator.calls(), eq(1));
    }

    #[tokio::test]
    async fn taiwan_ip_resolves_to_traditional_chinese() {
        let fixture = resolver_fixture(MemoryStore::new(), StubLocator::country("TW"), &["en-US"]);

        assert_that!(fixture.resolver.resolve().await, eq(LocaleCode::ZhTw));

        let detected = fixture.telemetry.named("language_auto_detected");
        assert_that!(detected.len(), eq(1));
        assert_that!(
            serde_json::Value::Object(detected[0].properties.clone()),
            eq(&json!({ "method": "ip_geolocation", "detected_language": "zh-TW", "country": "Taiwan" }))
        );
    }

    #[rstest]
    #[case(StubLocator::country("US"), &["zh-TW"], LocaleCode::ZhTw, ResolutionMethod::BrowserLanguage)]
    #[case(StubLocator::failing(), &["zh-Hant-HK"], LocaleCode::ZhTw, ResolutionMethod::BrowserLanguage)]
    #[case(StubLocator::failing(), &["zh-CN", "zh-TW"], LocaleCode::En, ResolutionMethod::Default)]
    #[case(StubLocator::country("JP"), &["ja-JP"], LocaleCode::En, ResolutionMethod::Default)]
    #[case(StubLocator::country("US"), &[], LocaleCode::En, ResolutionMethod::Default)]
    #[tokio::test]
    async fn falls_through_strategies(
        #[case] locator: StubLocator,
        #[case] languages: &[&str],
        #[case] locale: LocaleCode,
        #[case] method: ResolutionMethod,
    ) {
        let fixture = resolver_fixture(MemoryStore::new(), locator, languages);

        let resolution = fixture.resolver.resolution().await;

        assert_that!(resolution, eq(Resolution { locale, method }));
    }

    #[tokio::test]
    async fn default_reports_browser_language() {
        let fixture = resolver_fixture(MemoryStore::new(), StubLocator::failing(), &["de-DE", "en"]);

        fixture.resolver.resolve().await;

        let detected = fixture.telemetry.named("language_auto_detected");
        assert_that!(
            serde_json::Value::Object(detected[0].properties.clone()),
            eq(&json!({ "method": "default", "detected_language": "en", "browser_lang": "de-DE" }))
        );
    }

    #[tokio::test]
    async fn slow_geolocation_times_out() {
        let locator = Arc::new(StubLocator::new(StubReply::Country("TW".to_string()), Duration::from_secs(10)));
        let resolver = LocaleResolver::new(
            ResolverSettings { geolocation_timeout: Duration::from_millis(20), ..ResolverSettings::default() },
            Arc::new(MemoryStore::new()),
            locator.clone(),
            Arc::new(hint::StaticLanguageHint::new(["en-US"])),
            Arc::new(crate::telemetry::NoopTelemetry),
        );

        let resolution = resolver.resolution().await;

        assert_that!(resolution.method, eq(ResolutionMethod::Default));
        assert_that!(locator.calls(), eq(1));
    }

    #[tokio::test]
    async fn storage_errors_are_treated_as_absent() {
        let resolver = LocaleResolver::new(
            ResolverSettings::default(),
            Arc::new(BrokenStore),
            Arc::new(StubLocator::country("TW")),
            Arc::new(hint::StaticLanguageHint::default()),
            Arc::new(crate::telemetry::NoopTelemetry),
        );

        assert_that!(resolver.resolve().await, eq(LocaleCode::ZhTw));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let fixture = resolver_fixture(
            MemoryStore::new(),
            StubLocator::new(StubReply::Country("TW".to_string()), Duration::from_millis(20)),
            &[],
        );
        let resolver = &fixture.resolver;

        let (first, second, third) = tokio::join!(resolver.resolve(), resolver.resolve(), resolver.resolve());

        assert_that!(first, eq(LocaleCode::ZhTw));
        assert_that!(second, eq(first));
        assert_that!(third, eq(first));
        assert_that!(fixture.locator.calls(), eq(1));
        assert_that!(fixture.telemetry.named("language_auto_detected").len(), eq(1));
    }

    #[tokio::test]
    async fn resolution_is_memoized() {
        let fixture = resolver_fixture(MemoryStore::new(), StubLocator::country("TW"), &[]);

        assert_that!(fixture.resolver.last_resolution(), none());
        fixture.resolver.resolve().await;
        fixture.store.set(DEFAULT_STORAGE_KEY, "en").unwrap();

        assert_that!(fixture.resolver.resolve().await, eq(LocaleCode::ZhTw));
        assert_that!(fixture.locator.calls(), eq(1));
        assert_that!(
            fixture.resolver.last_resolution(),
            some(eq(Resolution { locale: LocaleCode::ZhTw, method: ResolutionMethod::IpGeolocation }))
        );
    }

    #[rstest]
    fn method_names() {
        let names: Vec<&str> = ResolutionMethod::ORDER.iter().map(|method| method.as_str()).collect();

        assert_that!(names, elements_are![
            eq(&"stored_preference"),
            eq(&"ip_geolocation"),
            eq(&"browser_language"),
            eq(&"default")
        ]);
    }
}
