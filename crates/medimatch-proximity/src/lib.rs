//! Proximity-ranked provider matching.
//!
//! A [`ProximityEngine`] is bound to one [`ProviderDirectory`] (and so to one
//! provider kind). It walks the city, region and coordinate tiers in order,
//! stopping as soon as it has `limit` in-radius results.

pub mod directory;
pub mod engine;
pub mod error;
pub mod format;
pub mod memory;
pub mod specialty;

pub use directory::ProviderDirectory;
pub use engine::{EngineSettings, ProximityEngine, RankedResult, SearchOutcome, SearchTier};
pub use error::{DirectoryError, SearchError};
pub use format::{format_results, FormattedProvider, LocationSummary, NearbyResponse, UserLocation};
pub use memory::InMemoryDirectory;
pub use specialty::{SpecialtyMapper, DICTIONARY_VERSION};
