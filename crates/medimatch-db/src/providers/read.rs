//! Read operations for the `providers` table.

use medimatch_core::ProviderKind;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::ProviderRow;

const PROVIDER_COLUMNS: &str = "id, public_id, kind, external_id, name, city, region, country, \
     latitude, longitude, specialties, raw_data, created_at, updated_at";

/// Providers of `kind` whose city equals `city`, ignoring case and
/// surrounding whitespace. A blank `city` matches nothing.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_providers_by_city(
    pool: &PgPool,
    kind: ProviderKind,
    city: &str,
) -> Result<Vec<ProviderRow>, sqlx::Error> {
    if city.trim().is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers \
         WHERE kind = $1 AND lower(btrim(city)) = lower(btrim($2)) \
         ORDER BY id"
    ))
    .bind(kind.as_str())
    .bind(city)
    .fetch_all(pool)
    .await
}

/// Same as [`list_providers_by_city`], matching on region.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_providers_by_region(
    pool: &PgPool,
    kind: ProviderKind,
    region: &str,
) -> Result<Vec<ProviderRow>, sqlx::Error> {
    if region.trim().is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers \
         WHERE kind = $1 AND lower(btrim(region)) = lower(btrim($2)) \
         ORDER BY id"
    ))
    .bind(kind.as_str())
    .bind(region)
    .fetch_all(pool)
    .await
}

/// Providers of `kind` with both latitude and longitude set.
///
/// Range validation happens on conversion to a record, not here.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_providers_with_coordinates(
    pool: &PgPool,
    kind: ProviderKind,
) -> Result<Vec<ProviderRow>, sqlx::Error> {
    sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers \
         WHERE kind = $1 AND latitude IS NOT NULL AND longitude IS NOT NULL \
         ORDER BY id"
    ))
    .bind(kind.as_str())
    .fetch_all(pool)
    .await
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_provider_by_public_id(
    pool: &PgPool,
    kind: ProviderKind,
    public_id: Uuid,
) -> Result<Option<ProviderRow>, sqlx::Error> {
    sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers WHERE kind = $1 AND public_id = $2"
    ))
    .bind(kind.as_str())
    .bind(public_id)
    .fetch_optional(pool)
    .await
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_providers(pool: &PgPool, kind: ProviderKind) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM providers WHERE kind = $1")
        .bind(kind.as_str())
        .fetch_one(pool)
        .await
}
