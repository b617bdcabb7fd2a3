//! Postgres-backed [`ProviderDirectory`].

use futures::future::BoxFuture;
use futures::FutureExt;
use medimatch_core::{ProviderKind, ProviderRecord};
use medimatch_proximity::{DirectoryError, ProviderDirectory};
use sqlx::PgPool;
use uuid::Uuid;

use crate::providers::{
    find_provider_by_public_id, list_providers_by_city, list_providers_by_region,
    list_providers_with_coordinates, ProviderRow,
};

/// Serves one [`ProviderKind`] out of the `providers` table.
#[derive(Debug, Clone)]
pub struct PgProviderDirectory {
    pool: PgPool,
    kind: ProviderKind,
}

impl PgProviderDirectory {
    #[must_use]
    pub fn new(pool: PgPool, kind: ProviderKind) -> Self {
        Self { pool, kind }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Rows that fail conversion are skipped with a warning.
fn into_records(rows: Vec<ProviderRow>) -> Vec<ProviderRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let public_id = row.public_id;
            match row.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(%public_id, error = %e, "skipping unreadable provider row");
                    None
                }
            }
        })
        .collect()
}

impl ProviderDirectory for PgProviderDirectory {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn query_by_city<'a>(
        &'a self,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>> {
        async move {
            let rows = list_providers_by_city(&self.pool, self.kind, city)
                .await
                .map_err(|e| DirectoryError::backend("query_by_city", e))?;
            Ok(into_records(rows))
        }
        .boxed()
    }

    fn query_by_region<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>> {
        async move {
            let rows = list_providers_by_region(&self.pool, self.kind, region)
                .await
                .map_err(|e| DirectoryError::backend("query_by_region", e))?;
            Ok(into_records(rows))
        }
        .boxed()
    }

    fn query_with_coordinates(&self) -> BoxFuture<'_, Result<Vec<ProviderRecord>, DirectoryError>> {
        async move {
            let rows = list_providers_with_coordinates(&self.pool, self.kind)
                .await
                .map_err(|e| DirectoryError::backend("query_with_coordinates", e))?;
            // Out-of-range pairs convert to `None`; the scan only wants usable ones.
            Ok(into_records(rows)
                .into_iter()
                .filter(|record| record.coordinates.is_some())
                .collect())
        }
        .boxed()
    }

    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<ProviderRecord>, DirectoryError>> {
        async move {
            let Ok(public_id) = Uuid::parse_str(id.trim()) else {
                return Ok(None);
            };
            let row = find_provider_by_public_id(&self.pool, self.kind, public_id)
                .await
                .map_err(|e| DirectoryError::backend("find_by_id", e))?;
            Ok(row.and_then(|row| into_records(vec![row]).pop()))
        }
        .boxed()
    }
}
