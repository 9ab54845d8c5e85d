//! Host language preference signal.

/// Read-only, ordered list of language tags the host environment prefers.
pub trait LanguageHint: Send + Sync {
    /// Tags, most preferred first.
    fn preferred_languages(&self) -> Vec<String>;

    /// The most preferred tag, if any.
    fn primary(&self) -> Option<String> {
        self.preferred_languages().into_iter().find(|tag| !tag.trim().is_empty())
    }
}

/// Operating system locales via `sys-locale`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLanguageHint;

impl LanguageHint for SystemLanguageHint {
    fn preferred_languages(&self) -> Vec<String> {
        sys_locale::get_locales().collect()
    }
}

/// A fixed list supplied by the embedder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLanguageHint(pub Vec<String>);

impl StaticLanguageHint {
    /// Hint answering with `tags`, in order.
    #[must_use]
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }
}

impl LanguageHint for StaticLanguageHint {
    fn preferred_languages(&self) -> Vec<String> {
        self.0.clone()
    }
}
