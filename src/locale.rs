//! Supported locales.

use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// A locale the page ships translations for.
///
/// The set is closed; anything else is coerced to [`LocaleCode::DEFAULT`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum LocaleCode {
    /// English, the default.
    #[default]
    #[serde(rename = "en")]
    En,
    /// Traditional Chinese as used in Taiwan.
    #[serde(rename = "zh-TW")]
    ZhTw,
}

/// A code outside the supported set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

impl LocaleCode {
    /// Fallback locale, also the one every other table falls back to per key.
    pub const DEFAULT: Self = Self::En;

    /// All supported locales, default first.
    pub const ALL: [Self; 2] = [Self::En, Self::ZhTw];

    /// The BCP 47 code, as stored and reported.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhTw => "zh-TW",
        }
    }

    /// Parses `code`, falling back to the default locale for unsupported values.
    #[must_use]
    pub fn coerce(code: &str) -> Self {
        code.parse().unwrap_or_else(|err: UnsupportedLocale| {
            tracing::debug!("{err}, using '{}'", Self::DEFAULT);
            Self::DEFAULT
        })
    }

    /// Whether this is [`Self::DEFAULT`].
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::En)
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocaleCode {
    type Err = UnsupportedLocale;

    /// Exact match against the supported codes. Stored preferences are written
    /// by this crate, so no case folding is applied.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.as_str() == s)
            .ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}

/// Returns true if a host language tag asks for Traditional Chinese as used in Taiwan.
///
/// The tag must be Chinese (`zh`) and carry either the `TW` region or the
/// `Hant` script, e.g. `zh-TW`, `zh_TW`, `zh-Hant`, `zh-Hant-HK`.
#[must_use]
pub fn is_traditional_chinese_tag(tag: &str) -> bool {
    let Ok(langid) = tag.trim().parse::<LanguageIdentifier>() else {
        tracing::debug!(tag, "Unparseable language tag");
        return false;
    };

    if langid.language.as_str() != "zh" {
        return false;
    }

    let taiwan = langid.region.is_some_and(|region| region.as_str() == "TW");
    let traditional = langid.script.is_some_and(|script| script.as_str() == "Hant");
    taiwan || traditional
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("en", LocaleCode::En)]
    #[case("zh-TW", LocaleCode::ZhTw)]
    fn from_str_supported(#[case] code: &str, #[case] expected: LocaleCode) {
        assert_that!(code.parse::<LocaleCode>(), ok(eq(&expected)));
    }

    #[rstest]
    #[case("")]
    #[case("fr")]
    #[case("zh-tw")]
    #[case("EN")]
    #[case("zh-CN")]
    #[case("{\"lang\":\"en\"}")]
    fn from_str_unsupported(#[case] code: &str) {
        assert_that!(code.parse::<LocaleCode>(), err(eq(&UnsupportedLocale(code.to_string()))));
    }

    #[rstest]
    #[case("zh-TW", LocaleCode::ZhTw)]
    #[case("ja", LocaleCode::En)]
    #[case("garbage", LocaleCode::En)]
    fn coerce_falls_back_to_default(#[case] code: &str, #[case] expected: LocaleCode) {
        assert_that!(LocaleCode::coerce(code), eq(expected));
    }

    #[rstest]
    fn display_and_serde_use_the_code() {
        assert_that!(LocaleCode::ZhTw.to_string(), eq("zh-TW"));
        assert_that!(serde_json::to_string(&LocaleCode::ZhTw).unwrap(), eq("\"zh-TW\""));
        assert_that!(serde_json::from_str::<LocaleCode>("\"en\"").unwrap(), eq(LocaleCode::En));
    }

    #[rstest]
    #[case::region_dash("zh-TW", true)]
    #[case::region_underscore("zh_TW", true)]
    #[case::script("zh-Hant", true)]
    #[case::script_other_region("zh-Hant-HK", true)]
    #[case::simplified("zh-CN", false)]
    #[case::bare_chinese("zh", false)]
    #[case::english("en-US", false)]
    #[case::taiwan_region_other_language("en-TW", false)]
    #[case::empty("", false)]
    fn traditional_chinese_tags(#[case] tag: &str, #[case] expected: bool) {
        assert_that!(is_traditional_chinese_tag(tag), eq(expected));
    }
}
