use medimatch_core::{ProviderKind, ProviderSeedFile};
use sqlx::PgPool;

use crate::providers::{upsert_providers, NewProvider};
use crate::DbError;

/// Counts reported after a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub hospitals: usize,
    pub doctors: usize,
    pub inserted: u64,
    pub updated: u64,
}

/// Upsert every hospital and doctor in `seed` into the `providers` table.
///
/// Specialties are normalized before persistence. Both kinds are written in
/// one transaction; if any row fails nothing is kept.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_providers(pool: &PgPool, seed: &ProviderSeedFile) -> Result<SeedSummary, DbError> {
    let rows: Vec<NewProvider> = seed
        .hospitals
        .iter()
        .map(|entry| NewProvider::from_seed(ProviderKind::Hospital, entry))
        .chain(
            seed.doctors
                .iter()
                .map(|entry| NewProvider::from_seed(ProviderKind::Doctor, entry)),
        )
        .collect();

    let (inserted, updated) = upsert_providers(pool, &rows).await?;
    tracing::info!(
        hospitals = seed.hospitals.len(),
        doctors = seed.doctors.len(),
        inserted,
        updated,
        "provider seed applied"
    );

    Ok(SeedSummary {
        hospitals: seed.hospitals.len(),
        doctors: seed.doctors.len(),
        inserted,
        updated,
    })
}
