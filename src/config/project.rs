//! Validated settings bound to a project directory.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    I18nSettings,
    loader,
};

/// Settings for one project, validated on load.
///
/// Relative paths in the settings resolve against [`Self::root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Directory holding `.landing-i18n.json`.
    root: PathBuf,
    /// Parsed and validated settings.
    settings: I18nSettings,
}

impl ProjectConfig {
    /// Loads `.landing-i18n.json` from `root`, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    /// - The file cannot be read or parsed
    /// - One or more fields fail validation
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let settings = loader::read_settings(&loader::config_path(&root))?.unwrap_or_else(|| {
            tracing::info!("No {} in {}, using defaults", loader::CONFIG_FILE_NAME, root.display());
            I18nSettings::default()
        });
        Self::new(root, settings)
    }

    /// Binds already parsed `settings` to `root`.
    ///
    /// # Errors
    /// One or more fields fail validation.
    pub fn new(root: impl Into<PathBuf>, settings: I18nSettings) -> Result<Self, ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        let root = root.into();
        tracing::debug!(root = %root.display(), ?settings, "Configuration ready");
        Ok(Self { root, settings })
    }

    /// Validated settings.
    #[must_use]
    pub const fn settings(&self) -> &I18nSettings {
        &self.settings
    }

    /// Base directory for relative paths.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Translation asset, or `None` for the embedded one.
    #[must_use]
    pub fn translations_path(&self) -> Option<PathBuf> {
        self.settings.translations_path(&self.root)
    }

    /// Bindings manifest.
    #[must_use]
    pub fn bindings_path(&self) -> PathBuf {
        self.settings.bindings_path(&self.root)
    }

    /// Preference file.
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.settings.preferences_path(&self.root)
    }
}
