//! Stubs shared by unit tests.
#![cfg(test)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::time::Duration;

use async_trait::async_trait;

use crate::preference::{
    MemoryStore,
    PreferenceStore,
    StorageError,
};
use crate::resolver::geo::{
    GeoError,
    GeoLocator,
};
use crate::resolver::hint::StaticLanguageHint;
use crate::resolver::{
    LocaleResolver,
    ResolverSettings,
};
use crate::telemetry::RecordingTelemetry;

/// What a [`StubLocator`] answers with.
#[derive(Debug, Clone)]
pub(crate) enum StubReply {
    /// A country code.
    Country(String),
    /// A non-2xx status.
    Status(u16),
    /// A panic inside the lookup.
    Panic,
}

/// Geolocator with a canned reply, an optional delay and a call counter.
#[derive(Debug)]
pub(crate) struct StubLocator {
    /// Canned reply.
    reply: StubReply,
    /// Sleep before replying.
    delay: Duration,
    /// Number of lookups so far.
    calls: AtomicUsize,
}

impl StubLocator {
    /// Immediately answers `code`.
    pub(crate) fn country(code: &str) -> Self {
        Self::new(StubReply::Country(code.to_string()), Duration::ZERO)
    }

    /// Immediately answers with a 503.
    pub(crate) fn failing() -> Self {
        Self::new(StubReply::Status(503), Duration::ZERO)
    }

    /// Panics on lookup.
    pub(crate) fn panicking() -> Self {
        Self::new(StubReply::Panic, Duration::ZERO)
    }

    /// Answers `reply` after `delay`.
    pub(crate) fn new(reply: StubReply, delay: Duration) -> Self {
        Self { reply, delay, calls: AtomicUsize::new(0) }
    }

    /// Lookups performed so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLocator for StubLocator {
    async fn country_code(&self) -> Result<String, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            StubReply::Country(code) => Ok(code.clone()),
            StubReply::Status(status) => Err(GeoError::Status(*status)),
            StubReply::Panic => panic!("geolocation stub panicked"),
        }
    }
}

/// Reads as empty and rejects every write.
#[derive(Debug, Default)]
pub(crate) struct UnwritableStore;

impl PreferenceStore for UnwritableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "storage is read-only")))
    }
}

/// A resolver wired to inspectable collaborators.
pub(crate) struct ResolverFixture {
    /// Preference storage.
    pub(crate) store: Arc<MemoryStore>,
    /// Geolocation stub.
    pub(crate) locator: Arc<StubLocator>,
    /// Recorded detection events.
    pub(crate) telemetry: Arc<RecordingTelemetry>,
    /// Resolver under test.
    pub(crate) resolver: LocaleResolver,
}

/// Builds a resolver with default settings around `store`, `locator` and the
/// host `languages`.
pub(crate) fn resolver_fixture(store: MemoryStore, locator: StubLocator, languages: &[&str]) -> ResolverFixture {
    let store = Arc::new(store);
    let locator = Arc::new(locator);
    let telemetry = Arc::new(RecordingTelemetry::new());
    let resolver = LocaleResolver::new(
        ResolverSettings::default(),
        store.clone(),
        locator.clone(),
        Arc::new(StaticLanguageHint::new(languages.iter().copied())),
        telemetry.clone(),
    );
    ResolverFixture { store, locator, telemetry, resolver }
}
