//! Geographic plumbing for provider matching: great-circle distance, caller
//! location resolution, and the HTTP collaborators behind it.

pub mod cache;
pub mod distance;
pub mod error;
pub mod ip_api;
pub mod nominatim;
pub mod resolver;
mod retry;
pub mod types;

pub use cache::{CachedReverseGeocoder, GeocodeCache};
pub use distance::{distance_km, EARTH_RADIUS_KM};
pub use error::GeoError;
pub use ip_api::IpApiClient;
pub use nominatim::NominatimClient;
pub use resolver::{
    default_location, is_public_ip, LocationInput, LocationResolver, DEFAULT_CITY,
    DEFAULT_COORDINATE, DEFAULT_COUNTRY, DEFAULT_REGION,
};
pub use types::{GeoLookup, IpGeolocator, Place, ReverseGeocoder};
