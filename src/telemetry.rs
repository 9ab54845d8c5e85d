//! Fire-and-forget product analytics.

use std::sync::{
    Mutex,
    PoisonError,
};

use serde_json::{
    Map,
    Value,
};

use crate::locale::LocaleCode;
use crate::resolver::ResolutionMethod;

/// Event properties.
pub type Properties = Map<String, Value>;

/// Receives analytics events.
///
/// Implementations must not block and must not panic; the engine never
/// inspects the outcome of a `track` call.
pub trait TelemetrySink: Send + Sync {
    /// Records one event.
    fn track(&self, event: &str, properties: Properties);
}

/// Events emitted by the localization engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// `language_auto_detected`
    LanguageDetected {
        /// Strategy that produced the locale.
        method: ResolutionMethod,
        /// Detected locale.
        locale: LocaleCode,
        /// Country name, for geolocation detections.
        country: Option<String>,
        /// Primary host language tag, when one was consulted.
        browser_language: Option<String>,
    },
    /// `language_applied`
    LanguageApplied {
        /// Applied locale.
        locale: LocaleCode,
        /// Time spent synchronizing bindings.
        elapsed_ms: u64,
    },
    /// `language_switched`
    LanguageSwitched {
        /// Locale before the switch.
        from: LocaleCode,
        /// Locale after the switch.
        to: LocaleCode,
    },
}

impl TelemetryEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LanguageDetected { .. } => "language_auto_detected",
            Self::LanguageApplied { .. } => "language_applied",
            Self::LanguageSwitched { .. } => "language_switched",
        }
    }

    /// Event properties, using the page's analytics property names.
    #[must_use]
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        match self {
            Self::LanguageDetected { method, locale, country, browser_language } => {
                props.insert("method".to_string(), method.as_str().into());
                props.insert("detected_language".to_string(), locale.as_str().into());
                if let Some(country) = country {
                    props.insert("country".to_string(), country.as_str().into());
                }
                if let Some(browser_language) = browser_language {
                    props.insert("browser_lang".to_string(), browser_language.as_str().into());
                }
            }
            Self::LanguageApplied { locale, elapsed_ms } => {
                props.insert("language".to_string(), locale.as_str().into());
                props.insert("performance_ms".to_string(), (*elapsed_ms).into());
                props.insert("method".to_string(), "apply_language".into());
            }
            Self::LanguageSwitched { from, to } => {
                props.insert("from".to_string(), from.as_str().into());
                props.insert("to".to_string(), to.as_str().into());
                props.insert("method".to_string(), "manual_switch".into());
            }
        }
        props
    }

    /// Hands the event to `sink`.
    pub fn emit(&self, sink: &dyn TelemetrySink) {
        sink.track(self.name(), self.properties());
    }
}

/// Logs events through `tracing` under the `telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn track(&self, event: &str, properties: Properties) {
        let properties = Value::Object(properties);
        tracing::info!(target: "telemetry", event, properties = %properties, "Analytics event");
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn track(&self, _event: &str, _properties: Properties) {}
}

/// A tracked event as recorded by [`RecordingTelemetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEvent {
    /// Event name.
    pub name: String,
    /// Event properties.
    pub properties: Properties,
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    /// Recorded events.
    events: Mutex<Vec<TrackedEvent>>,
}

impl RecordingTelemetry {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Events named `name`, in order.
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<TrackedEvent> {
        self.events().into_iter().filter(|event| event.name == name).collect()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn track(&self, event: &str, properties: Properties) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TrackedEvent { name: event.to_string(), properties });
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn switched_event_shape() {
        let event = TelemetryEvent::LanguageSwitched { from: LocaleCode::En, to: LocaleCode::ZhTw };

        assert_that!(event.name(), eq("language_switched"));
        assert_that!(
            Value::Object(event.properties()),
            eq(&json!({ "from": "en", "to": "zh-TW", "method": "manual_switch" }))
        );
    }

    #[rstest]
    fn detected_event_includes_optional_fields() {
        let event = TelemetryEvent::LanguageDetected {
            method: ResolutionMethod::IpGeolocation,
            locale: LocaleCode::ZhTw,
            country: Some("Taiwan".to_string()),
            browser_language: None,
        };

        assert_that!(
            Value::Object(event.properties()),
            eq(&json!({
                "method": "ip_geolocation",
                "detected_language": "zh-TW",
                "country": "Taiwan"
            }))
        );
    }

    #[rstest]
    fn applied_event_shape() {
        let event = TelemetryEvent::LanguageApplied { locale: LocaleCode::ZhTw, elapsed_ms: 12 };

        assert_that!(
            Value::Object(event.properties()),
            eq(&json!({ "language": "zh-TW", "performance_ms": 12, "method": "apply_language" }))
        );
    }

    #[rstest]
    #[case(TelemetryEvent::LanguageApplied { locale: LocaleCode::En, elapsed_ms: 0 })]
    #[case(TelemetryEvent::LanguageSwitched { from: LocaleCode::ZhTw, to: LocaleCode::En })]
    #[case(TelemetryEvent::LanguageDetected {
        method: ResolutionMethod::Default,
        locale: LocaleCode::En,
        country: None,
        browser_language: Some("de-DE".to_string()),
    })]
    fn tracing_sink_accepts_every_event(#[case] event: TelemetryEvent) {
        let sink = TracingTelemetry;

        event.emit(&sink);
        sink.track("custom_event", Properties::new());
    }

    #[rstest]
    fn recording_sink_keeps_order() {
        let sink = RecordingTelemetry::new();

        TelemetryEvent::LanguageApplied { locale: LocaleCode::En, elapsed_ms: 3 }.emit(&sink);
        TelemetryEvent::LanguageSwitched { from: LocaleCode::En, to: LocaleCode::ZhTw }.emit(&sink);

        let names: Vec<String> = sink.events().into_iter().map(|event| event.name).collect();
        assert_that!(names, elements_are![eq("language_applied"), eq("language_switched")]);
        assert_that!(sink.named("language_applied")[0].properties["performance_ms"], eq(&json!(3)));

        sink.clear();
        assert_that!(sink.events(), is_empty());
    }
}
