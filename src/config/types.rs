//! Project configuration schema and validation.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::resolver::geo::{
    DEFAULT_ENDPOINT,
    DisabledLocator,
    GeoLocator,
    IpApiLocator,
};
use crate::resolver::{
    DEFAULT_STORAGE_KEY,
    ResolverSettings,
};

/// Upper bound accepted for `geolocation.timeoutMs`.
const MAX_GEOLOCATION_TIMEOUT_MS: u64 = 30_000;

/// One invalid field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "geolocation.timeoutMs")
    pub field_path: String,
    /// What is wrong, with an example of a valid value.
    pub message: String,
}

impl ValidationError {
    /// Error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Failure to load project configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every field that failed validation.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The file exists but cannot be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid JSON for [`I18nSettings`].
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `.landing-i18n.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    /// Translation asset. The embedded catalog is used when unset.
    pub translations_file: Option<String>,

    /// Bindings manifest, relative to the project root.
    pub bindings_file: String,

    /// Where the chosen locale is persisted.
    pub preferences: PreferencesConfig,
    /// IP geolocation strategy.
    pub geolocation: GeolocationConfig,
}

/// `preferences` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesConfig {
    /// Preference file, relative to the project root.
    pub path: String,
    /// Key the locale is stored under.
    pub key: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self { path: ".landing-i18n/preferences.json".to_string(), key: DEFAULT_STORAGE_KEY.to_string() }
    }
}

/// `geolocation` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeolocationConfig {
    /// `false` skips the strategy without any network access.
    pub enabled: bool,
    /// ipapi.co compatible JSON endpoint.
    pub endpoint: String,
    /// Lookup budget in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: true, endpoint: DEFAULT_ENDPOINT.to_string(), timeout_ms: 3000 }
    }
}

impl GeolocationConfig {
    /// `timeout_ms` as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The locator this section describes.
    ///
    /// Falls back to [`DisabledLocator`] when the HTTP locator cannot be
    /// built, so a broken geolocation setup never blocks rendering.
    #[must_use]
    pub fn locator(&self) -> Arc<dyn GeoLocator> {
        if !self.enabled {
            tracing::debug!("IP geolocation disabled");
            return Arc::new(DisabledLocator);
        }
        match IpApiLocator::new(&self.endpoint, self.timeout()) {
            Ok(locator) => Arc::new(locator),
            Err(error) => {
                tracing::warn!("IP geolocation unavailable, skipping: {}", error);
                Arc::new(DisabledLocator)
            }
        }
    }
}

impl I18nSettings {
    /// Checks every field and reports all problems at once.
    ///
    /// # Errors
    /// - Required field is empty
    /// - Endpoint is not an http(s) URL
    /// - Timeout out of range
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(file) = &self.translations_file
            && file.is_empty()
        {
            errors.push(ValidationError::new(
                "translationsFile",
                "The path cannot be empty. Please specify a JSON file, or remove this field to use the bundled translations",
            ));
        }

        if self.bindings_file.is_empty() {
            errors.push(ValidationError::new(
                "bindingsFile",
                "The path cannot be empty. Example: \"bindings.json\"",
            ));
        }

        if self.preferences.path.is_empty() {
            errors.push(ValidationError::new(
                "preferences.path",
                "The path cannot be empty. Example: \".landing-i18n/preferences.json\"",
            ));
        }

        if self.preferences.key.is_empty() {
            errors.push(ValidationError::new(
                "preferences.key",
                format!("The key cannot be empty. Example: \"{DEFAULT_STORAGE_KEY}\""),
            ));
        }

        let endpoint = &self.geolocation.endpoint;
        match reqwest::Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "geolocation.endpoint",
                format!("Unsupported scheme '{}'. Only http and https are allowed", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "geolocation.endpoint",
                format!("Invalid URL '{endpoint}': {e}"),
            )),
        }

        if !(1..=MAX_GEOLOCATION_TIMEOUT_MS).contains(&self.geolocation.timeout_ms) {
            errors.push(ValidationError::new(
                "geolocation.timeoutMs",
                format!("The timeout must be between 1 and {MAX_GEOLOCATION_TIMEOUT_MS} milliseconds"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Storage key and geolocation timeout for the resolver.
    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            storage_key: self.preferences.key.clone(),
            geolocation_timeout: self.geolocation.timeout(),
        }
    }

    /// Translation asset under `root`, if configured.
    #[must_use]
    pub fn translations_path(&self, root: &Path) -> Option<PathBuf> {
        self.translations_file.as_ref().map(|file| root.join(file))
    }

    /// Bindings manifest under `root`.
    #[must_use]
    pub fn bindings_path(&self, root: &Path) -> PathBuf {
        root.join(&self.bindings_file)
    }

    /// Preference file under `root`.
    #[must_use]
    pub fn preferences_path(&self, root: &Path) -> PathBuf {
        root.join(&self.preferences.path)
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            translations_file: None,
            bindings_file: "bindings.json".to_string(),
            preferences: PreferencesConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::resolver::geo::GeoError;

    #[rstest]
    fn validate_valid_settings() {
        let settings = I18nSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"geolocation": {"enabled": false}, "translationsFile": "i18n/site.json"}"#;

        let settings: I18nSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.geolocation.enabled, eq(false));
        assert_that!(settings.geolocation.timeout_ms, eq(3000));
        assert_that!(settings.translations_file, some(eq("i18n/site.json")));
        assert_that!(settings.preferences.key, eq("adsopti_language"));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let json = "{}";

        let settings: I18nSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings, eq(&I18nSettings::default()));
        assert_that!(settings.bindings_file, eq("bindings.json"));
        assert_that!(settings.geolocation.endpoint, eq("https://ipapi.co/json/"));
    }

    #[rstest]
    fn validate_invalid_bindings_file_empty() {
        let settings = I18nSettings { bindings_file: String::new(), ..I18nSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("bindingsFile")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_preference_key_empty() {
        let settings = I18nSettings {
            preferences: PreferencesConfig { key: String::new(), ..PreferencesConfig::default() },
            ..I18nSettings::default()
        };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("preferences.key")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    #[case("ftp://example.com/geo", "Unsupported scheme 'ftp'")]
    #[case("not a url", "Invalid URL 'not a url'")]
    fn validate_invalid_endpoint(#[case] endpoint: &str, #[case] message: &str) {
        let settings = I18nSettings {
            geolocation: GeolocationConfig { endpoint: endpoint.to_string(), ..GeolocationConfig::default() },
            ..I18nSettings::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("geolocation.endpoint")),
                field!(ValidationError.message, contains_substring(message))
            ]])
        );
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(30_000, true)]
    #[case(30_001, false)]
    fn validate_timeout_range(#[case] timeout_ms: u64, #[case] valid: bool) {
        let settings = I18nSettings {
            geolocation: GeolocationConfig { timeout_ms, ..GeolocationConfig::default() },
            ..I18nSettings::default()
        };

        assert_that!(settings.validate().is_ok(), eq(valid));
    }

    #[rstest]
    fn resolver_settings_follow_config() {
        let settings = I18nSettings {
            preferences: PreferencesConfig { key: "lang".to_string(), ..PreferencesConfig::default() },
            geolocation: GeolocationConfig { timeout_ms: 500, ..GeolocationConfig::default() },
            ..I18nSettings::default()
        };

        let resolver = settings.resolver_settings();

        assert_that!(resolver.storage_key, eq("lang"));
        assert_that!(resolver.geolocation_timeout, eq(Duration::from_millis(500)));
    }

    #[rstest]
    #[case(GeolocationConfig { enabled: false, ..GeolocationConfig::default() })]
    #[case(GeolocationConfig { endpoint: "not a url".to_string(), ..GeolocationConfig::default() })]
    #[tokio::test]
    async fn unusable_geolocation_degrades_to_disabled(#[case] config: GeolocationConfig) {
        let locator = config.locator();

        assert!(matches!(locator.country_code().await, Err(GeoError::Disabled)));
    }

    #[rstest]
    fn paths_are_relative_to_root() {
        let settings =
            I18nSettings { translations_file: Some("i18n.json".to_string()), ..I18nSettings::default() };
        let root = Path::new("/srv/site");

        assert_that!(settings.translations_path(root), some(eq(&PathBuf::from("/srv/site/i18n.json"))));
        assert_that!(settings.bindings_path(root), eq(&PathBuf::from("/srv/site/bindings.json")));
        assert_that!(I18nSettings::default().translations_path(root), none());
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = I18nSettings {
            bindings_file: String::new(),
            geolocation: GeolocationConfig { timeout_ms: 0, ..GeolocationConfig::default() },
            ..I18nSettings::default()
        };

        let validation_result = settings.validate();
        let errors = validation_result.unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. bindingsFile"));
        assert_that!(error_message, contains_substring("cannot be empty"));
        assert_that!(error_message, contains_substring("2. geolocation.timeoutMs"));
        assert_that!(error_message, contains_substring("between 1 and 30000"));
    }
}
