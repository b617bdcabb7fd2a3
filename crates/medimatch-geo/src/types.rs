use std::net::IpAddr;

use futures::future::BoxFuture;
use medimatch_core::Coordinate;

use crate::error::GeoError;

/// Result of an IP geolocation lookup. Coordinates are unvalidated here;
/// the resolver range-checks them before use.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLookup {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Administrative names for a point, as returned by reverse geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Place {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.region.is_none() && self.country.is_none()
    }
}

/// Resolves a public IP address to an approximate location.
pub trait IpGeolocator: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> BoxFuture<'_, Result<GeoLookup, GeoError>>;
}

/// Resolves a point to city/region/country names.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, at: Coordinate) -> BoxFuture<'_, Result<Place, GeoError>>;
}
