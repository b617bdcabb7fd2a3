//! Caller location resolution.
//!
//! `resolve` never fails: explicit coordinates win, then a public IP lookup,
//! then the fixed default location. Collaborator errors and timeouts are
//! logged and swallowed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use medimatch_core::{AppConfig, Coordinate, LocationRecord, LocationSource};

use crate::cache::{CachedReverseGeocoder, GeocodeCache};
use crate::error::GeoError;
use crate::ip_api::IpApiClient;
use crate::nominatim::NominatimClient;
use crate::types::{GeoLookup, IpGeolocator, ReverseGeocoder};

/// Fallback location used when nothing better is known (Bengaluru city centre).
pub const DEFAULT_COORDINATE: Coordinate = Coordinate::from_static(12.9716, 77.5946);
pub const DEFAULT_CITY: &str = "Bengaluru";
pub const DEFAULT_REGION: &str = "Karnataka";
pub const DEFAULT_COUNTRY: &str = "India";

/// The process-wide default location record.
#[must_use]
pub fn default_location() -> LocationRecord {
    LocationRecord {
        coordinates: DEFAULT_COORDINATE,
        city: Some(DEFAULT_CITY.to_string()),
        region: Some(DEFAULT_REGION.to_string()),
        country: Some(DEFAULT_COUNTRY.to_string()),
        source: LocationSource::DefaultFallback,
    }
}

/// Raw location hints supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInput {
    pub coordinates: Option<Coordinate>,
    /// Client IP as text; unparseable values are treated as absent.
    pub ip_address: Option<String>,
}

impl LocationInput {
    #[must_use]
    pub fn from_coordinates(coordinates: Coordinate) -> Self {
        Self {
            coordinates: Some(coordinates),
            ip_address: None,
        }
    }

    #[must_use]
    pub fn from_ip(ip_address: impl Into<String>) -> Self {
        Self {
            coordinates: None,
            ip_address: Some(ip_address.into()),
        }
    }
}

/// Returns `true` when `ip` is routable on the public internet and worth
/// sending to a geolocation service.
#[must_use]
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared_cgnat = a == 100 && (64..128).contains(&b);
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || shared_cgnat)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

/// Turns [`LocationInput`] into a best-effort [`LocationRecord`].
#[derive(Clone)]
pub struct LocationResolver {
    geolocator: Option<Arc<dyn IpGeolocator>>,
    reverse_geocoder: Option<Arc<dyn ReverseGeocoder>>,
    timeout: Duration,
}

impl LocationResolver {
    /// A resolver with no collaborators: explicit coordinates or the default.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            geolocator: None,
            reverse_geocoder: None,
            timeout,
        }
    }

    #[must_use]
    pub fn with_geolocator(mut self, geolocator: Arc<dyn IpGeolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    #[must_use]
    pub fn with_reverse_geocoder(mut self, reverse_geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.reverse_geocoder = Some(reverse_geocoder);
        self
    }

    /// Wires the HTTP collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if either HTTP client cannot be constructed or a
    /// configured base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        let timeout = Duration::from_secs(config.geolocation_timeout_secs);
        let geolocator = IpApiClient::with_base_url(
            &config.user_agent,
            timeout,
            config.http_max_retries,
            &config.geolocation_base_url,
        )?;
        let mut resolver = Self::new(timeout).with_geolocator(Arc::new(geolocator));

        if config.reverse_geocode_enabled {
            let nominatim = NominatimClient::with_base_url(
                &config.user_agent,
                timeout,
                config.http_max_retries,
                &config.reverse_geocode_base_url,
            )?;
            let cache = GeocodeCache::new(
                config.geocode_cache_capacity,
                Duration::from_secs(config.geocode_cache_ttl_secs),
            );
            resolver =
                resolver.with_reverse_geocoder(Arc::new(CachedReverseGeocoder::new(nominatim, cache)));
        }

        Ok(resolver)
    }

    /// Resolves the caller's location. Never fails.
    pub async fn resolve(&self, input: &LocationInput) -> LocationRecord {
        if let Some(coordinates) = input.coordinates {
            return LocationRecord::from_coordinates(coordinates, LocationSource::Explicit);
        }

        let ip = input
            .ip_address
            .as_deref()
            .map(str::trim)
            .and_then(|raw| raw.parse::<IpAddr>().ok());

        let Some(ip) = ip else {
            tracing::debug!("no usable client IP; using default location");
            return default_location();
        };

        if !is_public_ip(ip) {
            tracing::debug!(%ip, "non-public client IP; using default location");
            return default_location();
        }

        let Some(geolocator) = &self.geolocator else {
            return default_location();
        };

        match tokio::time::timeout(self.timeout, geolocator.lookup(ip)).await {
            Ok(Ok(lookup)) => match record_from_lookup(lookup) {
                Some(record) => record,
                None => {
                    tracing::warn!(%ip, "IP geolocation returned out-of-range coordinates");
                    default_location()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(%ip, error = %e, "IP geolocation failed; using default location");
                default_location()
            }
            Err(_) => {
                tracing::warn!(
                    %ip,
                    timeout = ?self.timeout,
                    "IP geolocation timed out; using default location"
                );
                default_location()
            }
        }
    }

    /// Fills in city/region/country for a coordinate-only record.
    ///
    /// Records that already carry a city or region, or a resolver without a
    /// reverse geocoder, come back unchanged. Failures leave the record as-is.
    pub async fn enrich(&self, record: LocationRecord) -> LocationRecord {
        if record.city_name().is_some() || record.region_name().is_some() {
            return record;
        }
        let Some(reverse_geocoder) = &self.reverse_geocoder else {
            return record;
        };

        let at = record.coordinates;
        match tokio::time::timeout(self.timeout, reverse_geocoder.reverse(at)).await {
            Ok(Ok(place)) => LocationRecord {
                coordinates: at,
                city: place.city,
                region: place.region,
                country: place.country.or(record.country),
                source: LocationSource::ReverseGeocode,
            },
            Ok(Err(e)) => {
                tracing::warn!(
                    latitude = at.latitude(),
                    longitude = at.longitude(),
                    error = %e,
                    "reverse geocode failed; continuing with raw coordinates"
                );
                record
            }
            Err(_) => {
                tracing::warn!(
                    latitude = at.latitude(),
                    longitude = at.longitude(),
                    timeout = ?self.timeout,
                    "reverse geocode timed out; continuing with raw coordinates"
                );
                record
            }
        }
    }

    /// `resolve` followed by `enrich`.
    pub async fn resolve_enriched(&self, input: &LocationInput) -> LocationRecord {
        let record = self.resolve(input).await;
        self.enrich(record).await
    }
}

fn record_from_lookup(lookup: GeoLookup) -> Option<LocationRecord> {
    let coordinates = Coordinate::new(lookup.latitude, lookup.longitude).ok()?;
    Some(LocationRecord {
        coordinates,
        city: lookup.city,
        region: lookup.region,
        country: lookup.country,
        source: LocationSource::IpGeolocation,
    })
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
