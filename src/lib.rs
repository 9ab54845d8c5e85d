//! landing-i18n
//!
//! Bilingual (English / Traditional Chinese) localization engine for a static
//! landing page: locale detection, translation lookup with per-key fallback,
//! placeholder interpolation and binding synchronization.

pub mod binding;
pub mod config;
pub mod engine;
pub mod interpolate;
pub mod locale;
pub mod preference;
pub mod render;
pub mod resolver;
pub mod store;
pub mod sync;
pub mod telemetry;

mod test_utils;

pub use binding::{
    Binding,
    BindingManifest,
    BindingSource,
    ElementId,
    RenderMode,
};
pub use engine::{
    LanguageOption,
    LocalizationEngine,
};
pub use locale::LocaleCode;
pub use render::{
    RenderSink,
    RenderedDocument,
};
pub use resolver::{
    LocaleResolver,
    ResolutionMethod,
};
pub use store::TranslationCatalog;
pub use sync::{
    LocalizationContext,
    TextSynchronizer,
};
