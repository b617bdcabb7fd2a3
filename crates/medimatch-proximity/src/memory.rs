//! A snapshot directory held in memory.
//!
//! Used by the CLI's offline mode and throughout the test suites.

use futures::future::BoxFuture;
use futures::FutureExt;
use medimatch_core::{Coordinate, ProviderKind, ProviderRecord, ProviderSeed};

use crate::directory::ProviderDirectory;
use crate::error::DirectoryError;

#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    kind: ProviderKind,
    records: Vec<ProviderRecord>,
}

impl InMemoryDirectory {
    /// Records of a different kind are dropped.
    #[must_use]
    pub fn new(kind: ProviderKind, records: Vec<ProviderRecord>) -> Self {
        let records = records.into_iter().filter(|r| r.kind == kind).collect();
        Self { kind, records }
    }

    /// Builds a directory from seed entries, using `external_id` as the id.
    #[must_use]
    pub fn from_seed(kind: ProviderKind, seeds: &[ProviderSeed]) -> Self {
        let records = seeds
            .iter()
            .map(|seed| ProviderRecord {
                id: seed.external_id.trim().to_string(),
                kind,
                name: seed.name.trim().to_string(),
                coordinates: Coordinate::from_optional(seed.latitude, seed.longitude),
                city: seed.city.clone(),
                region: seed.region.clone(),
                specialties: seed.specialty_names(),
                raw: seed.passthrough(),
            })
            .collect();
        Self { kind, records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching(
        &self,
        pick: impl Fn(&ProviderRecord) -> Option<&str>,
        wanted: &str,
    ) -> Vec<ProviderRecord> {
        let wanted = wanted.trim().to_lowercase();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| pick(r).is_some_and(|v| v.trim().to_lowercase() == wanted))
            .cloned()
            .collect()
    }
}

impl ProviderDirectory for InMemoryDirectory {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn query_by_city<'a>(
        &'a self,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>> {
        let found = self.matching(|r| r.city.as_deref(), city);
        async move { Ok(found) }.boxed()
    }

    fn query_by_region<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>> {
        let found = self.matching(|r| r.region.as_deref(), region);
        async move { Ok(found) }.boxed()
    }

    fn query_with_coordinates(&self) -> BoxFuture<'_, Result<Vec<ProviderRecord>, DirectoryError>> {
        let found: Vec<ProviderRecord> = self
            .records
            .iter()
            .filter(|r| r.coordinates.is_some())
            .cloned()
            .collect();
        async move { Ok(found) }.boxed()
    }

    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<ProviderRecord>, DirectoryError>> {
        let found = self.records.iter().find(|r| r.id == id).cloned();
        async move { Ok(found) }.boxed()
    }
}
