//! Renders the bound landing page strings for a project and prints them as JSON.
//!
//! Usage: `landing-i18n [PROJECT_ROOT] [LOCALE]`

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;
use std::sync::Arc;

use landing_i18n::binding::BindingError;
use landing_i18n::config::{
    ConfigError,
    ProjectConfig,
};
use landing_i18n::preference::FileStore;
use landing_i18n::resolver::hint::SystemLanguageHint;
use landing_i18n::store::CatalogError;
use landing_i18n::telemetry::TracingTelemetry;
use landing_i18n::{
    BindingManifest,
    LanguageOption,
    LocalizationEngine,
    RenderedDocument,
    TranslationCatalog,
};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

/// Errors that abort the command.
#[derive(Error, Debug)]
enum CliError {
    /// `.landing-i18n.json` is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The translation asset is unreadable or malformed.
    #[error("Failed to load translations: {0}")]
    Catalog(#[from] CatalogError),

    /// The bindings manifest is malformed.
    #[error(transparent)]
    Bindings(#[from] BindingError),

    /// Stdout is closed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// The report cannot be encoded.
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What gets printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    /// Rendered bindings and document metadata.
    #[serde(flatten)]
    document: &'a RenderedDocument,
    /// `lang-xx` class for the page body.
    body_class: Option<String>,
    /// Switcher entries.
    language_options: Vec<LanguageOption>,
}

/// Logs to stderr, reports on stdout.
#[tokio::main]
async fn main() -> ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let mut args = std::env::args().skip(1);
    let project_root = args.next().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let requested_locale = args.next();

    match run(project_root, requested_locale.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

/// Loads the project, renders it and prints the report.
async fn run(project_root: PathBuf, requested_locale: Option<&str>) -> Result<(), CliError> {
    let config = ProjectConfig::load(project_root)?;
    let settings = config.settings();

    let catalog = match config.translations_path() {
        Some(path) => TranslationCatalog::load(&path)?,
        None => TranslationCatalog::embedded()?,
    };
    let bindings = load_bindings(&config.bindings_path())?;

    let mut engine = LocalizationEngine::builder(Arc::new(catalog))
        .settings(settings.resolver_settings())
        .store(Arc::new(FileStore::new(config.preferences_path())))
        .geolocator(settings.geolocation.locator())
        .language_hint(Arc::new(SystemLanguageHint))
        .telemetry(Arc::new(TracingTelemetry))
        .build();

    let mut document = RenderedDocument::new();
    engine.bootstrap(&bindings, &mut document).await;
    if let Some(requested) = requested_locale {
        engine.switch_locale(requested, &bindings, &mut document);
    }

    let report = Report {
        document: &document,
        body_class: document.body_class(),
        language_options: engine.language_options(),
    };
    let mut output = serde_json::to_vec_pretty(&report)?;
    output.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&output).await?;
    stdout.flush().await?;
    Ok(())
}

/// A missing manifest renders metadata only.
fn load_bindings(path: &Path) -> Result<BindingManifest, BindingError> {
    if !path.exists() {
        tracing::warn!("Bindings file not found: {}", path.display());
        return Ok(BindingManifest::default());
    }
    BindingManifest::load(path)
}
