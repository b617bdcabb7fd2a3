use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::location::Coordinate;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Hospital,
    Doctor,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Hospital => "hospital",
            ProviderKind::Doctor => "doctor",
        }
    }

    /// Collection name used in responses (`hospitals`, `doctors`).
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            ProviderKind::Hospital => "hospitals",
            ProviderKind::Doctor => "doctors",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hospital" | "hospitals" => Ok(ProviderKind::Hospital),
            "doctor" | "doctors" => Ok(ProviderKind::Doctor),
            other => Err(CoreError::InvalidProviderKind(other.to_string())),
        }
    }
}

/// A hospital or doctor as seen by the matching engine.
///
/// Read-only from the engine's perspective. `coordinates` is `None` for
/// records whose source row lacks a usable lat/lng pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub kind: ProviderKind,
    pub name: String,
    pub coordinates: Option<Coordinate>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub specialties: BTreeSet<String>,
    /// Opaque passthrough fields (address, phone, ratings, ...).
    pub raw: serde_json::Value,
}

/// How a specialty filter behaves when it would empty the city and region tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialtyFilterPolicy {
    /// Fall through to an unfiltered coordinate scan rather than return nothing.
    #[default]
    Preference,
    /// Never return providers outside the requested specialties.
    Strict,
}

impl FromStr for SpecialtyFilterPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preference" => Ok(SpecialtyFilterPolicy::Preference),
            "strict" => Ok(SpecialtyFilterPolicy::Strict),
            other => Err(CoreError::InvalidSpecialtyPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for SpecialtyFilterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecialtyFilterPolicy::Preference => write!(f, "preference"),
            SpecialtyFilterPolicy::Strict => write!(f, "strict"),
        }
    }
}
