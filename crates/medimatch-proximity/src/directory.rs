use futures::future::BoxFuture;
use medimatch_core::{ProviderKind, ProviderRecord};

use crate::error::DirectoryError;

/// Read-only access to the hospitals or doctors the engine ranks.
///
/// An implementation serves exactly one [`ProviderKind`]. City and region
/// matching is case-insensitive equality on trimmed text.
pub trait ProviderDirectory: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn query_by_city<'a>(
        &'a self,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>>;

    fn query_by_region<'a>(
        &'a self,
        region: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, DirectoryError>>;

    /// Every provider with a usable coordinate pair.
    fn query_with_coordinates(&self) -> BoxFuture<'_, Result<Vec<ProviderRecord>, DirectoryError>>;

    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<ProviderRecord>, DirectoryError>>;
}
