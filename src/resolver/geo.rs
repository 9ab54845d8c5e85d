//! Country lookup by client IP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Default free geolocation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ipapi.co/json/";

/// Why no country code is available.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Transport or body decoding failure.
    #[error("Geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("Geolocation service responded with status {0}")]
    Status(u16),

    /// The body has no usable `country_code`.
    #[error("Geolocation response has no country code")]
    MissingCountry,

    /// The configured endpoint does not parse as a URL.
    #[error("Invalid geolocation endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The lookup exceeded its budget.
    #[error("Geolocation timed out after {0:?}")]
    Timeout(Duration),

    /// Geolocation is turned off.
    #[error("Geolocation is disabled")]
    Disabled,
}

/// Best-effort lookup of the client's ISO country code.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// ISO 3166-1 alpha-2 code of the client.
    ///
    /// # Errors
    /// Any failure; callers treat every error as "no signal".
    async fn country_code(&self) -> Result<String, GeoError>;
}

/// The only part of the response body that matters.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    /// Absent on rate-limit and error payloads.
    #[serde(default)]
    country_code: Option<String>,
}

/// Queries an ipapi.co compatible JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    /// Client carrying the request timeout.
    client: reqwest::Client,
    /// Parsed endpoint.
    endpoint: reqwest::Url,
}

impl IpApiLocator {
    /// Locator for `endpoint`, giving up after `timeout`.
    ///
    /// # Errors
    /// - `endpoint` is not a URL
    /// - The HTTP client cannot be built
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GeoError> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|e| GeoError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn country_code(&self) -> Result<String, GeoError> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting geolocation");
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status(status.as_u16()));
        }

        let body: GeoResponse = response.json().await?;
        body.country_code.filter(|code| !code.is_empty()).ok_or(GeoError::MissingCountry)
    }
}

/// Never consults the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocator;

#[async_trait]
impl GeoLocator for DisabledLocator {
    async fn country_code(&self) -> Result<String, GeoError> {
        Err(GeoError::Disabled)
    }
}
