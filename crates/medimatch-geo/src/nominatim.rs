//! Reverse geocoding against a Nominatim-compatible service.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use medimatch_core::Coordinate;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::GeoError;
use crate::retry::Backoff;
use crate::types::{Place, ReverseGeocoder};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";
const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<String>,
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    fn into_place(self) -> Place {
        let city = [self.city, self.town, self.village, self.county]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());
        let region = [self.state, self.state_district]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());
        let country = self
            .country
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Place {
            city,
            region,
            country,
        }
    }
}

pub struct NominatimClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
}

impl NominatimClient {
    /// Creates a client for the public OpenStreetMap Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(user_agent: &str, timeout: Duration, max_retries: u32) -> Result<Self, GeoError> {
        Self::with_base_url(user_agent, timeout, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (self-hosted instance or mock).
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

    /// Resolves a point to city, region and country names.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Lookup`] if the service reports an error (e.g. open ocean)
    ///   or returns no usable names.
    /// - [`GeoError::Http`] / [`GeoError::Deserialize`] on transport or body
    ///   failures.
    pub async fn reverse_geocode(&self, at: Coordinate) -> Result<Place, GeoError> {
        let url = self.build_url(at)?;
        Backoff::new(self.max_retries, RETRY_BACKOFF_BASE)
            .run(|| self.request_reverse(&url))
            .await
    }

    fn build_url(&self, at: Coordinate) -> Result<Url, GeoError> {
        let mut url = self
            .base_url
            .join("reverse")
            .map_err(|e| GeoError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &at.latitude().to_string())
            .append_pair("lon", &at.longitude().to_string());
        Ok(url)
    }

    async fn request_reverse(&self, url: &Url) -> Result<Place, GeoError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let parsed: ReverseResponse =
            serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if let Some(message) = parsed.error {
            return Err(GeoError::Lookup(message));
        }

        let place = parsed.address.map(Address::into_place).unwrap_or_default();
        if place.is_empty() {
            return Err(GeoError::Lookup(
                "reverse geocode returned no address".to_string(),
            ));
        }
        Ok(place)
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, at: Coordinate) -> BoxFuture<'_, Result<Place, GeoError>> {
        self.reverse_geocode(at).boxed()
    }
}
