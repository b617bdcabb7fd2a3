//! Provider seed file loading.
//!
//! Seed files are operator-maintained YAML with `hospitals:` and `doctors:`
//! lists. Specialty values are kept as raw JSON because real exports mix
//! plain strings, comma-separated strings and `{name: ...}` objects; the
//! database layer normalizes them before persistence.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSeed {
    pub external_id: String,
    pub name: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub specialties: serde_json::Value,
    /// Everything else on the entry, carried through as passthrough data.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProviderSeed {
    /// Specialty names flattened to a set of trimmed strings.
    #[must_use]
    pub fn specialty_names(&self) -> BTreeSet<String> {
        normalize_specialties(&self.specialties)
    }

    /// Passthrough fields as a JSON object.
    #[must_use]
    pub fn passthrough(&self) -> serde_json::Value {
        serde_json::Value::Object(self.extra.clone())
    }
}

/// Flatten the specialty shapes found in provider exports into a set of names.
///
/// Accepts a plain string (split on commas), an array of strings, an array of
/// `{name: ...}` objects, or any mix of those. Blank names and other JSON
/// types are dropped.
#[must_use]
pub fn normalize_specialties(value: &serde_json::Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_specialties(value, &mut names);
    names
}

fn collect_specialties(value: &serde_json::Value, names: &mut BTreeSet<String>) {
    match value {
        serde_json::Value::String(s) => {
            names.extend(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(ToString::to_string),
            );
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_specialties(item, names);
            }
        }
        serde_json::Value::Object(map) => {
            if let Some(name) = map.get("name").or_else(|| map.get("specialty")) {
                if name.is_string() {
                    collect_specialties(name, names);
                }
            }
        }
        _ => {}
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderSeedFile {
    #[serde(default)]
    pub hospitals: Vec<ProviderSeed>,
    #[serde(default)]
    pub doctors: Vec<ProviderSeed>,
}

/// Load and validate a provider seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_provider_seed(path: &Path) -> Result<ProviderSeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed: ProviderSeedFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_seed(&seed)?;

    Ok(seed)
}

fn validate_seed(seed: &ProviderSeedFile) -> Result<(), ConfigError> {
    for (label, entries) in [("hospital", &seed.hospitals), ("doctor", &seed.doctors)] {
        let mut seen_ids = HashSet::new();
        for entry in entries {
            if entry.external_id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{label} '{}' has an empty external_id",
                    entry.name
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{label} '{}' has an empty name",
                    entry.external_id
                )));
            }
            if !seen_ids.insert(entry.external_id.trim().to_string()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate {label} external_id: '{}'",
                    entry.external_id
                )));
            }
        }
    }
    Ok(())
}
