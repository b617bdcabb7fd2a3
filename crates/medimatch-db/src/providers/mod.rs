//! Database operations for the `providers` table.

mod read;
mod types;
mod write;

pub use read::{
    count_providers, find_provider_by_public_id, list_providers_by_city,
    list_providers_by_region, list_providers_with_coordinates,
};
pub use types::{NewProvider, ProviderRow};
pub use write::upsert_providers;
