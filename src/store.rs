//! Translation tables and key lookup.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::locale::LocaleCode;

/// Translation data bundled with the crate.
const EMBEDDED_TRANSLATIONS: &str = include_str!("../assets/translations.json");

/// Separator between segments of a translation key.
pub const KEY_SEPARATOR: char = '.';

/// Why translation data could not be loaded.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The file cannot be read.
    #[error("Failed to read translation file: {0}")]
    Io(#[from] std::io::Error),

    /// The data is not valid JSON.
    #[error("Failed to parse translations: {0}")]
    Parse(#[from] serde_json::Error),

    /// The top level is not an object.
    #[error("Translation data must be an object keyed by locale code")]
    NotAnObject,

    /// A supported locale maps to something other than an object.
    #[error("Translation table for '{0}' must be an object")]
    InvalidTable(LocaleCode),

    /// Nothing to fall back to.
    #[error("Missing translation table for default locale '{0}'")]
    MissingDefault(LocaleCode),
}

/// Walks `key` through `node` one segment at a time.
///
/// Objects are entered by name, arrays by numeric index. Returns `None` as soon
/// as a segment is missing, the current node cannot be entered, or the final
/// node is not a string.
///
/// ```
/// use serde_json::json;
/// use landing_i18n::store::lookup;
///
/// let table = json!({ "a": { "b": { "c": "X" } } });
/// assert_eq!(lookup(&table, "a.b.c"), Some("X"));
/// assert_eq!(lookup(&table, "a.x.c"), None);
/// ```
#[must_use]
pub fn lookup<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    key.split(KEY_SEPARATOR)
        .try_fold(node, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })?
        .as_str()
}

/// Flattens string leaves into dot-separated keys.
///
/// Array elements use their index as the segment (`items.0`) so every
/// returned key is accepted by [`lookup`].
#[must_use]
pub fn flatten_keys(node: &Value) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    flatten_value(node, None, &mut result);
    result
}

/// Collects the string leaves under `node` into `result`.
fn flatten_value(node: &Value, prefix: Option<&str>, result: &mut BTreeSet<String>) {
    let join = |segment: &str| {
        prefix.map_or_else(|| segment.to_string(), |p| format!("{p}{KEY_SEPARATOR}{segment}"))
    };

    match node {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_value(value, Some(&join(key)), result);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_value(value, Some(&join(&index.to_string())), result);
            }
        }
        Value::String(_) => {
            if let Some(key) = prefix {
                result.insert(key.to_string());
            }
        }
        _ => {}
    }
}

/// The nested key-value tree for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationTable {
    /// Always an object once constructed through [`Self::new`] or [`Self::empty`].
    root: Value,
}

impl TranslationTable {
    /// Wraps a JSON object. Anything else is rejected by returning `None`.
    #[must_use]
    pub fn new(root: Value) -> Option<Self> {
        root.is_object().then_some(Self { root })
    }

    /// A table without keys.
    #[must_use]
    pub fn empty() -> Self {
        Self { root: Value::Object(serde_json::Map::new()) }
    }

    /// String at dotted `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        lookup(&self.root, key)
    }

    /// Every addressable key.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<String> {
        flatten_keys(&self.root)
    }
}

/// Immutable translation tables for every supported locale.
///
/// Tables are keyed by [`LocaleCode`]; a locale missing from the source data
/// gets an empty table so every key falls back to the default locale.
#[derive(Debug, Clone)]
pub struct TranslationCatalog {
    /// One table per supported locale.
    tables: BTreeMap<LocaleCode, TranslationTable>,
}

impl TranslationCatalog {
    /// Loads the translation data bundled with the crate.
    ///
    /// # Errors
    /// Only if the bundled asset is malformed.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(EMBEDDED_TRANSLATIONS)
    }

    /// Loads translation data from a JSON file.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Structural errors (see [`Self::from_value`])
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        tracing::debug!("Loading translations from: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses translation JSON.
    ///
    /// # Errors
    /// JSON parse error or structural errors (see [`Self::from_value`]).
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Builds the catalog from `{ "<locale>": { ... }, ... }`.
    ///
    /// Unsupported locale codes are skipped with a warning.
    ///
    /// # Errors
    /// - The top level is not an object
    /// - A supported locale's table is not an object
    /// - The default locale's table is missing
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let Value::Object(locales) = value else {
            return Err(CatalogError::NotAnObject);
        };

        let mut tables = BTreeMap::new();
        for (code, root) in locales {
            let Ok(locale) = code.parse::<LocaleCode>() else {
                tracing::warn!(code, "Skipping translations for unsupported locale");
                continue;
            };
            let table = TranslationTable::new(root).ok_or(CatalogError::InvalidTable(locale))?;
            tables.insert(locale, table);
        }

        if !tables.contains_key(&LocaleCode::DEFAULT) {
            return Err(CatalogError::MissingDefault(LocaleCode::DEFAULT));
        }
        for locale in LocaleCode::ALL {
            tables.entry(locale).or_insert_with(|| {
                tracing::warn!(%locale, "No translations found, every key falls back");
                TranslationTable::empty()
            });
        }

        let catalog = Self { tables };
        catalog.report_coverage();
        Ok(catalog)
    }

    /// Table for `locale`.
    #[must_use]
    pub fn table(&self, locale: LocaleCode) -> Option<&TranslationTable> {
        self.tables.get(&locale)
    }

    /// Resolves `key` for `locale`, falling back to the default locale per key.
    #[must_use]
    pub fn resolve(&self, locale: LocaleCode, key: &str) -> Option<&str> {
        self.table(locale).and_then(|table| table.get(key)).or_else(|| {
            if locale.is_default() {
                return None;
            }
            let fallback = self.table(LocaleCode::DEFAULT)?.get(key);
            if fallback.is_some() {
                tracing::debug!(%locale, key, "Translation missing, using default locale");
            }
            fallback
        })
    }

    /// Keys of the default table that `locale` does not translate, sorted.
    #[must_use]
    pub fn untranslated_keys(&self, locale: LocaleCode) -> Vec<String> {
        let Some(default) = self.table(LocaleCode::DEFAULT) else {
            return Vec::new();
        };
        let translated = self.table(locale).map(TranslationTable::keys).unwrap_or_default();
        default.keys().into_iter().filter(|key| !translated.contains(key)).collect()
    }

    /// Warns about locales that rely on per-key fallback.
    fn report_coverage(&self) {
        for locale in LocaleCode::ALL.into_iter().filter(|locale| !locale.is_default()) {
            let missing = self.untranslated_keys(locale);
            if !missing.is_empty() {
                tracing::warn!(
                    %locale,
                    missing = missing.len(),
                    "Locale is partially translated; missing keys render in '{}'",
                    LocaleCode::DEFAULT
                );
                tracing::debug!(%locale, ?missing, "Untranslated keys");
            }
        }
    }
}
