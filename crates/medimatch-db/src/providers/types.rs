//! Row types for the `providers` table.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use medimatch_core::{Coordinate, CoreError, ProviderKind, ProviderRecord, ProviderSeed};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Input record for upserting a provider, keyed by `(kind, external_id)`.
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub kind: ProviderKind,
    pub external_id: String,
    pub name: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub specialties: Vec<String>,
    pub raw_data: serde_json::Value,
}

impl NewProvider {
    /// Trims identifiers and flattens the seed's specialty shapes.
    #[must_use]
    pub fn from_seed(kind: ProviderKind, seed: &ProviderSeed) -> Self {
        Self {
            kind,
            external_id: seed.external_id.trim().to_string(),
            name: seed.name.trim().to_string(),
            city: seed.city.clone(),
            region: seed.region.clone(),
            country: seed.country.clone(),
            latitude: seed.latitude,
            longitude: seed.longitude,
            specialties: seed.specialty_names().into_iter().collect(),
            raw_data: seed.passthrough(),
        }
    }
}

/// A row from the `providers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: i64,
    pub public_id: Uuid,
    pub kind: String,
    pub external_id: String,
    pub name: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub specialties: Vec<String>,
    pub raw_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderRow {
    /// Converts the row into the engine's view of a provider.
    ///
    /// The id is the public UUID. A row with only one coordinate, or with
    /// values outside the valid range, gets `coordinates = None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidProviderKind`] if `kind` holds an unknown value.
    pub fn into_record(self) -> Result<ProviderRecord, CoreError> {
        let kind = self.kind.parse::<ProviderKind>()?;
        let coordinates = Coordinate::from_optional(
            self.latitude.and_then(|d| d.to_f64()),
            self.longitude.and_then(|d| d.to_f64()),
        );
        let specialties: BTreeSet<String> = self
            .specialties
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(ProviderRecord {
            id: self.public_id.to_string(),
            kind,
            name: self.name,
            coordinates,
            city: self.city,
            region: self.region,
            specialties,
            raw: self.raw_data,
        })
    }
}
