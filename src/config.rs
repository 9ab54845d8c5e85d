//! Project configuration (`.landing-i18n.json`).

/// Config file reading
mod loader;
/// Settings bound to a project directory
mod project;
/// Configuration types and settings
mod types;

pub use project::ProjectConfig;
pub use types::{
    ConfigError,
    GeolocationConfig,
    I18nSettings,
    PreferencesConfig,
    ValidationError,
};
