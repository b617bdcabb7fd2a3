//! Tiered proximity search.
//!
//! Tiers run strictly in order: city match, region match, coordinate scan.
//! Each tier is bounded by `tier_timeout`; a slow or failing tier counts as
//! empty. The engine stops after the first tier that brings the accepted
//! count up to `limit`.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use medimatch_core::{
    AppConfig, Coordinate, LocationRecord, ProviderKind, ProviderRecord, SpecialtyFilterPolicy,
};
use medimatch_geo::distance_km;
use serde::{Deserialize, Serialize};

use crate::directory::ProviderDirectory;
use crate::error::{DirectoryError, SearchError};
use crate::specialty::{contains_phrase, words};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchTier {
    CityExact,
    RegionFallback,
    CoordinateScan,
}

impl SearchTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchTier::CityExact => "city-exact",
            SearchTier::RegionFallback => "region-fallback",
            SearchTier::CoordinateScan => "coordinate-scan",
        }
    }
}

impl std::fmt::Display for SearchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub provider: ProviderRecord,
    pub distance_km: f64,
    pub distance_is_estimated: bool,
}

/// Ranked results plus provenance for the response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<RankedResult>,
    /// The last tier executed.
    pub search_method: SearchTier,
    pub tiers_attempted: Vec<SearchTier>,
    /// True when the specialty filter was dropped for the coordinate scan.
    pub specialty_filter_relaxed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub tier_timeout: Duration,
    pub city_estimate_km: f64,
    pub region_estimate_km: f64,
    pub specialty_policy: SpecialtyFilterPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tier_timeout: Duration::from_millis(2_500),
            city_estimate_km: 5.0,
            region_estimate_km: 25.0,
            specialty_policy: SpecialtyFilterPolicy::Preference,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tier_timeout: Duration::from_millis(config.tier_timeout_ms),
            city_estimate_km: config.city_estimate_km,
            region_estimate_km: config.region_estimate_km,
            specialty_policy: config.specialty_policy,
        }
    }
}

/// Accumulates accepted results across tiers, first occurrence wins.
struct Accumulator {
    origin: Coordinate,
    radius_km: f64,
    seen: HashSet<String>,
    results: Vec<RankedResult>,
}

impl Accumulator {
    fn new(origin: Coordinate, radius_km: f64) -> Self {
        Self {
            origin,
            radius_km,
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.results.len()
    }

    /// Offers a provider; `estimate_km` applies when it lacks coordinates.
    /// Returns whether it was accepted.
    fn offer(&mut self, provider: ProviderRecord, estimate_km: Option<f64>) -> bool {
        if self.seen.contains(&provider.id) {
            return false;
        }
        let (distance, distance_is_estimated) = match (provider.coordinates, estimate_km) {
            (Some(at), _) => (distance_km(self.origin, at), false),
            (None, Some(estimate)) => (estimate, true),
            (None, None) => return false,
        };
        if distance > self.radius_km {
            return false;
        }
        self.seen.insert(provider.id.clone());
        self.results.push(RankedResult {
            provider,
            distance_km: distance,
            distance_is_estimated,
        });
        true
    }

    fn into_sorted(mut self, limit: usize) -> Vec<RankedResult> {
        self.results.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.provider.id.cmp(&b.provider.id))
        });
        self.results.truncate(limit);
        self.results
    }
}

/// Requested specialties as lower-cased words; empty means no filter.
struct SpecialtyFilter(Vec<Vec<String>>);

impl SpecialtyFilter {
    fn new(specialties: &BTreeSet<String>) -> Self {
        Self(
            specialties
                .iter()
                .map(|s| words(s))
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    fn is_active(&self) -> bool {
        !self.0.is_empty()
    }

    /// A provider passes if one of its specialties contains a requested name
    /// as whole words: "Cardiology" admits "Interventional Cardiology" but
    /// "Urology" does not admit "Neurology".
    fn admits(&self, provider: &ProviderRecord) -> bool {
        if self.0.is_empty() {
            return true;
        }
        provider.specialties.iter().any(|offered| {
            let offered = words(offered);
            self.0
                .iter()
                .any(|wanted| contains_phrase(&offered, wanted, false))
        })
    }
}

/// Ranks providers from one directory around a caller's location.
#[derive(Clone)]
pub struct ProximityEngine {
    directory: Arc<dyn ProviderDirectory>,
    settings: EngineSettings,
}

impl ProximityEngine {
    #[must_use]
    pub fn new(directory: Arc<dyn ProviderDirectory>, settings: EngineSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.directory.kind()
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Finds up to `limit` providers within `radius_km` of `location`.
    ///
    /// Results are sorted by distance, then id, and carry no duplicate ids.
    /// Providers without coordinates that match on city or region get the
    /// configured estimate distance and `distance_is_estimated = true`; like
    /// every other result they are dropped when that distance exceeds the
    /// radius.
    ///
    /// # Errors
    ///
    /// Only input errors: [`SearchError::InvalidRadius`] for a non-positive or
    /// non-finite radius and [`SearchError::InvalidLimit`] for a zero limit.
    /// The directory is not touched when the input is rejected. Directory
    /// failures and timeouts are logged and never returned.
    pub async fn find_nearby(
        &self,
        location: &LocationRecord,
        radius_km: f64,
        specialties: &BTreeSet<String>,
        limit: usize,
    ) -> Result<SearchOutcome, SearchError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(SearchError::InvalidRadius(radius_km));
        }
        if limit == 0 {
            return Err(SearchError::InvalidLimit);
        }

        let filter = SpecialtyFilter::new(specialties);
        let mut accepted = Accumulator::new(location.coordinates, radius_km);
        let mut tiers_attempted = Vec::with_capacity(3);

        if let Some(city) = location.city_name() {
            tiers_attempted.push(SearchTier::CityExact);
            let records = self
                .run_tier(SearchTier::CityExact, self.directory.query_by_city(city))
                .await;
            let added = absorb(
                &mut accepted,
                records,
                Some(&filter),
                Some(self.settings.city_estimate_km),
            );
            tracing::debug!(
                tier = %SearchTier::CityExact,
                city,
                added,
                total = accepted.len(),
                "tier complete"
            );
        }

        if accepted.len() < limit {
            if let Some(region) = location.region_name() {
                tiers_attempted.push(SearchTier::RegionFallback);
                let records = self
                    .run_tier(
                        SearchTier::RegionFallback,
                        self.directory.query_by_region(region),
                    )
                    .await;
                let added = absorb(
                    &mut accepted,
                    records,
                    Some(&filter),
                    Some(self.settings.region_estimate_km),
                );
                tracing::debug!(
                    tier = %SearchTier::RegionFallback,
                    region,
                    added,
                    total = accepted.len(),
                    "tier complete"
                );
            }
        }

        let mut specialty_filter_relaxed = false;
        if accepted.len() < limit {
            tiers_attempted.push(SearchTier::CoordinateScan);
            let records = self
                .run_tier(
                    SearchTier::CoordinateScan,
                    self.directory.query_with_coordinates(),
                )
                .await;
            let text_tier_hits = accepted.len();
            let mut added = absorb(&mut accepted, records.iter().cloned(), Some(&filter), None);

            if added == 0
                && text_tier_hits == 0
                && filter.is_active()
                && self.settings.specialty_policy == SpecialtyFilterPolicy::Preference
            {
                added = absorb(&mut accepted, records, None, None);
                specialty_filter_relaxed = added > 0;
                tracing::debug!(
                    added,
                    "specialty filter matched nothing; coordinate scan ran unfiltered"
                );
            }
            tracing::debug!(
                tier = %SearchTier::CoordinateScan,
                added,
                total = accepted.len(),
                "tier complete"
            );
        } else {
            tracing::debug!(
                limit,
                tiers = tiers_attempted.len(),
                "limit reached; skipping remaining tiers"
            );
        }

        let search_method = tiers_attempted
            .last()
            .copied()
            .unwrap_or(SearchTier::CoordinateScan);

        Ok(SearchOutcome {
            results: accepted.into_sorted(limit),
            search_method,
            tiers_attempted,
            specialty_filter_relaxed,
        })
    }

    /// Looks a provider up by id, swallowing directory failures.
    pub async fn find_by_id(&self, id: &str) -> Option<ProviderRecord> {
        let lookup = self.directory.find_by_id(id);
        match tokio::time::timeout(self.settings.tier_timeout, lookup).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                tracing::warn!(id, error = %e, "directory lookup by id failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    id,
                    timeout = ?self.settings.tier_timeout,
                    "directory lookup by id timed out"
                );
                None
            }
        }
    }

    async fn run_tier<F>(&self, tier: SearchTier, query: F) -> Vec<ProviderRecord>
    where
        F: Future<Output = Result<Vec<ProviderRecord>, DirectoryError>>,
    {
        match tokio::time::timeout(self.settings.tier_timeout, query).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                tracing::warn!(
                    tier = %tier,
                    kind = %self.kind(),
                    error = %e,
                    "directory tier failed"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    tier = %tier,
                    kind = %self.kind(),
                    timeout = ?self.settings.tier_timeout,
                    "directory tier timed out"
                );
                Vec::new()
            }
        }
    }
}

/// Offers each record that passes `filter`; returns how many were accepted.
fn absorb(
    accepted: &mut Accumulator,
    records: impl IntoIterator<Item = ProviderRecord>,
    filter: Option<&SpecialtyFilter>,
    estimate_km: Option<f64>,
) -> usize {
    let mut added = 0;
    for record in records {
        if filter.is_some_and(|f| !f.admits(&record)) {
            continue;
        }
        if accepted.offer(record, estimate_km) {
            added += 1;
        }
    }
    added
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
