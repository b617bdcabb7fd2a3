//! HTTP client for an ip-api.com compatible IP geolocation service.
//!
//! `GET {base}/json/{ip}` answers with `{"status": "success", "lat", "lon",
//! "city", "regionName", "country"}` or `{"status": "fail", "message"}`.

use std::net::IpAddr;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::GeoError;
use crate::retry::Backoff;
use crate::types::{GeoLookup, IpGeolocator};

const DEFAULT_BASE_URL: &str = "http://ip-api.com/";
const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

/// Client for the IP geolocation service.
///
/// Use [`IpApiClient::new`] for production or [`IpApiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct IpApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
}

impl IpApiClient {
    /// Creates a client pointed at the public ip-api.com endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(user_agent: &str, timeout: Duration, max_retries: u32) -> Result<Self, GeoError> {
        Self::with_base_url(user_agent, timeout, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`GeoError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        user_agent: &str,
        timeout: Duration,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(3)))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| GeoError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            max_retries,
        })
    }

    /// Looks up the location of a single IP address, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Lookup`] if the service reports `status != "success"` or
    ///   omits coordinates.
    /// - [`GeoError::Http`] on network failure or non-2xx status.
    /// - [`GeoError::Deserialize`] if the body is not the expected shape.
    pub async fn lookup_ip(&self, ip: IpAddr) -> Result<GeoLookup, GeoError> {
        let url = self.build_url(ip);
        Backoff::new(self.max_retries, RETRY_BACKOFF_BASE)
            .run(|| self.request_lookup(&url))
            .await
    }

    fn build_url(&self, ip: IpAddr) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map(|mut segments| {
                segments.pop_if_empty().push("json").push(&ip.to_string());
            })
            .ok();
        url
    }

    async fn request_lookup(&self, url: &Url) -> Result<GeoLookup, GeoError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let parsed: IpApiResponse =
            serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if parsed.status != "success" {
            return Err(GeoError::Lookup(
                parsed
                    .message
                    .unwrap_or_else(|| format!("status '{}'", parsed.status)),
            ));
        }

        let (Some(latitude), Some(longitude)) = (parsed.lat, parsed.lon) else {
            return Err(GeoError::Lookup(
                "response is missing coordinates".to_string(),
            ));
        };

        Ok(GeoLookup {
            latitude,
            longitude,
            city: non_empty(parsed.city),
            region: non_empty(parsed.region_name),
            country: non_empty(parsed.country),
        })
    }
}

impl IpGeolocator for IpApiClient {
    fn lookup(&self, ip: IpAddr) -> BoxFuture<'_, Result<GeoLookup, GeoError>> {
        self.lookup_ip(ip).boxed()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
