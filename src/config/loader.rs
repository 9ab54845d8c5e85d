//! Reading `.landing-i18n.json` from disk.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    I18nSettings,
};

/// Name of the configuration file at the project root.
pub(super) const CONFIG_FILE_NAME: &str = ".landing-i18n.json";

/// Location of the configuration file for `project_root`.
pub(super) fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

/// Parses the configuration file at `path`.
///
/// A missing file is not an error and yields `None`. Unknown fields are
/// ignored and absent fields take their defaults.
///
/// # Errors
/// The file exists but cannot be read, or is not valid JSON.
pub(super) fn read_settings(path: &Path) -> Result<Option<I18nSettings>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No configuration file");
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };

    tracing::debug!(path = %path.display(), "Loading configuration");
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn reads_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(temp_dir.path());
        fs::write(&path, r#"{"bindingsFile": "page/bindings.json"}"#).unwrap();

        let settings = read_settings(&path).unwrap().unwrap();

        assert_that!(settings.bindings_file, eq("page/bindings.json"));
        assert_that!(settings.geolocation.timeout_ms, eq(3000));
    }

    #[rstest]
    fn missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();

        assert_that!(read_settings(&config_path(temp_dir.path())).unwrap(), none());
    }

    #[rstest]
    #[case("invalid json")]
    #[case(r#"{"geolocation": {"timeoutMs": "fast"}}"#)]
    fn malformed_file_is_parse_error(#[case] content: &str) {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(temp_dir.path());
        fs::write(&path, content).unwrap();

        assert!(matches!(read_settings(&path), Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    fn unknown_fields_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(temp_dir.path());
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        assert_that!(read_settings(&path).unwrap(), some(eq(&I18nSettings::default())));
    }

    #[rstest]
    fn directory_in_place_of_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(temp_dir.path());
        fs::create_dir(&path).unwrap();

        assert!(matches!(read_settings(&path), Err(ConfigError::IoError(_))));
    }
}
