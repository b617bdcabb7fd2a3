//! Coordinate and resolved-location value types.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A validated WGS84 point. Construct with [`Coordinate::new`]; deserialization
/// runs the same range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting NaN, infinities and out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when latitude is outside
    /// `[-90, 90]` or longitude outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let invalid = |reason| CoreError::InvalidCoordinate {
            latitude,
            longitude,
            reason,
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid("coordinates must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("longitude must be within [-180, 180]"));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate from compile-time constants.
    ///
    /// Intended for `const` items; out-of-range values fail const evaluation.
    #[must_use]
    #[allow(clippy::manual_range_contains)]
    pub const fn from_static(latitude: f64, longitude: f64) -> Self {
        assert!(latitude >= -90.0 && latitude <= 90.0, "latitude out of range");
        assert!(
            longitude >= -180.0 && longitude <= 180.0,
            "longitude out of range"
        );
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate from a possibly-partial pair, as stored on provider
    /// rows. Returns `None` unless both halves are present and valid.
    #[must_use]
    pub fn from_optional(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Where a [`LocationRecord`]'s data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    Explicit,
    IpGeolocation,
    ReverseGeocode,
    DefaultFallback,
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationSource::Explicit => write!(f, "explicit"),
            LocationSource::IpGeolocation => write!(f, "ip-geolocation"),
            LocationSource::ReverseGeocode => write!(f, "reverse-geocode"),
            LocationSource::DefaultFallback => write!(f, "default-fallback"),
        }
    }
}

/// Best-effort location of the caller. Request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub coordinates: Coordinate,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub source: LocationSource,
}

impl LocationRecord {
    /// A location carrying only raw coordinates.
    #[must_use]
    pub fn from_coordinates(coordinates: Coordinate, source: LocationSource) -> Self {
        Self {
            coordinates,
            city: None,
            region: None,
            country: None,
            source,
        }
    }

    /// The trimmed city, if one is known and non-blank.
    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }

    /// The trimmed region/state, if one is known and non-blank.
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        non_blank(self.region.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
