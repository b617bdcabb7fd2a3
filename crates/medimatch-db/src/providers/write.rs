//! Write operations for the `providers` table.

use sqlx::{PgConnection, PgPool};

use super::types::NewProvider;

/// Upsert a batch of providers inside one transaction.
///
/// Returns `(new_count, updated_count)`. If any row fails the whole batch
/// is rolled back.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any statement fails.
pub async fn upsert_providers(
    pool: &PgPool,
    providers: &[NewProvider],
) -> Result<(u64, u64), sqlx::Error> {
    if providers.is_empty() {
        return Ok((0, 0));
    }

    let mut tx = pool.begin().await?;
    let mut new_count = 0u64;
    let mut updated_count = 0u64;

    for provider in providers {
        if upsert_provider(&mut *tx, provider).await? {
            new_count += 1;
        } else {
            updated_count += 1;
        }
    }

    tx.commit().await?;
    Ok((new_count, updated_count))
}

/// Returns `true` when the row did not exist before.
///
/// Coordinates are bound as `float8` and cast by Postgres into the
/// `NUMERIC(9,6)` columns.
async fn upsert_provider(
    conn: &mut PgConnection,
    provider: &NewProvider,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "INSERT INTO providers \
             (kind, external_id, name, city, region, country, \
              latitude, longitude, specialties, raw_data) \
         VALUES ($1, $2, $3, $4, $5, $6, $7::float8, $8::float8, $9::text[], $10) \
         ON CONFLICT (kind, external_id) DO UPDATE SET \
             name        = EXCLUDED.name, \
             city        = EXCLUDED.city, \
             region      = EXCLUDED.region, \
             country     = EXCLUDED.country, \
             latitude    = EXCLUDED.latitude, \
             longitude   = EXCLUDED.longitude, \
             specialties = EXCLUDED.specialties, \
             raw_data    = EXCLUDED.raw_data, \
             updated_at  = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(provider.kind.as_str())
    .bind(&provider.external_id)
    .bind(&provider.name)
    .bind(&provider.city)
    .bind(&provider.region)
    .bind(&provider.country)
    .bind(provider.latitude)
    .bind(provider.longitude)
    .bind(&provider.specialties)
    .bind(&provider.raw_data)
    .fetch_one(conn)
    .await
}
