//! Uniform output records and the nearby-search response body.

use medimatch_core::{LocationRecord, LocationSource, ProviderKind};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::engine::{RankedResult, SearchOutcome, SearchTier};

/// Keys owned by [`FormattedProvider`]; passthrough fields never override them.
const RESERVED_KEYS: &[&str] = &[
    "id",
    "name",
    "distanceKm",
    "distanceIsEstimated",
    "specialties",
    "location",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub city: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One provider as returned to callers, whichever tier produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedProvider {
    pub id: String,
    pub name: String,
    pub distance_km: f64,
    pub distance_is_estimated: bool,
    pub specialties: Vec<String>,
    pub location: LocationSummary,
    #[serde(flatten)]
    pub passthrough: serde_json::Map<String, serde_json::Value>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl From<&RankedResult> for FormattedProvider {
    fn from(result: &RankedResult) -> Self {
        let provider = &result.provider;
        let passthrough = match &provider.raw {
            serde_json::Value::Object(map) => map
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => serde_json::Map::new(),
        };
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            distance_km: round2(result.distance_km),
            distance_is_estimated: result.distance_is_estimated,
            specialties: provider.specialties.iter().cloned().collect(),
            location: LocationSummary {
                city: trimmed(provider.city.as_ref()),
                region: trimmed(provider.region.as_ref()),
                latitude: provider.coordinates.map(|c| c.latitude()),
                longitude: provider.coordinates.map(|c| c.longitude()),
            },
            passthrough,
        }
    }
}

/// Shapes ranked results for output, preserving their order.
#[must_use]
pub fn format_results(results: &[RankedResult]) -> Vec<FormattedProvider> {
    results.iter().map(FormattedProvider::from).collect()
}

/// The caller's resolved location as echoed back in responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub source: LocationSource,
}

impl From<&LocationRecord> for UserLocation {
    fn from(record: &LocationRecord) -> Self {
        Self {
            latitude: record.coordinates.latitude(),
            longitude: record.coordinates.longitude(),
            city: record.city.clone(),
            region: record.region.clone(),
            country: record.country.clone(),
            source: record.source,
        }
    }
}

/// Body of a single-kind nearby search.
///
/// Serializes as `{hospitals|doctors, userLocation, searchRadius, count,
/// searchMethod, specialtyFilterRelaxed}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyResponse {
    pub kind: ProviderKind,
    pub providers: Vec<FormattedProvider>,
    pub user_location: UserLocation,
    pub search_radius: f64,
    pub search_method: SearchTier,
    pub specialty_filter_relaxed: bool,
}

impl NearbyResponse {
    #[must_use]
    pub fn new(
        kind: ProviderKind,
        outcome: &SearchOutcome,
        location: &LocationRecord,
        search_radius: f64,
    ) -> Self {
        Self {
            kind,
            providers: format_results(&outcome.results),
            user_location: UserLocation::from(location),
            search_radius,
            search_method: outcome.search_method,
            specialty_filter_relaxed: outcome.specialty_filter_relaxed,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.providers.len()
    }
}

impl Serialize for NearbyResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry(self.kind.plural(), &self.providers)?;
        map.serialize_entry("userLocation", &self.user_location)?;
        map.serialize_entry("searchRadius", &self.search_radius)?;
        map.serialize_entry("count", &self.count())?;
        map.serialize_entry("searchMethod", &self.search_method)?;
        map.serialize_entry("specialtyFilterRelaxed", &self.specialty_filter_relaxed)?;
        map.end()
    }
}
