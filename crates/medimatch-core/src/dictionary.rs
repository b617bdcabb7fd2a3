use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub keyword: String,
    pub specialties: Vec<String>,
}

/// Operator-supplied replacement for the built-in keyword → specialty table.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyDictionaryFile {
    pub version: String,
    pub entries: Vec<DictionaryEntry>,
}

/// Load and validate a specialty dictionary from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_specialty_dictionary(path: &Path) -> Result<SpecialtyDictionaryFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let dictionary: SpecialtyDictionaryFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_dictionary(&dictionary)?;

    Ok(dictionary)
}

fn validate_dictionary(dictionary: &SpecialtyDictionaryFile) -> Result<(), ConfigError> {
    if dictionary.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "specialty dictionary version must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &dictionary.entries {
        let keyword = entry.keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(ConfigError::Validation(
                "specialty dictionary keyword must be non-empty".to_string(),
            ));
        }
        if entry.specialties.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' maps to no specialties",
                entry.keyword
            )));
        }
        if !seen.insert(keyword) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword: '{}'",
                entry.keyword
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(keyword: &str, specialties: &[&str]) -> DictionaryEntry {
        DictionaryEntry {
            keyword: keyword.to_string(),
            specialties: specialties.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn validate_rejects_duplicate_keyword_case_insensitively() {
        let dictionary = SpecialtyDictionaryFile {
            version: "1".to_string(),
            entries: vec![
                entry("Diabetes", &["Endocrinology"]),
                entry("diabetes", &["Internal Medicine"]),
            ],
        };
        let err = validate_dictionary(&dictionary).unwrap_err();
        assert!(err.to_string().contains("duplicate keyword"));
    }

    #[test]
    fn validate_rejects_entry_without_specialties() {
        let dictionary = SpecialtyDictionaryFile {
            version: "1".to_string(),
            entries: vec![entry("rash", &[" "])],
        };
        let err = validate_dictionary(&dictionary).unwrap_err();
        assert!(err.to_string().contains("maps to no specialties"));
    }

    #[test]
    fn validate_rejects_blank_version() {
        let dictionary = SpecialtyDictionaryFile {
            version: String::new(),
            entries: vec![],
        };
        assert!(validate_dictionary(&dictionary).is_err());
    }

    #[test]
    fn load_dictionary_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("specialties.yaml");
        let result = load_specialty_dictionary(&path);
        assert!(result.is_ok(), "failed to load specialties.yaml: {result:?}");
        assert!(!result.unwrap().entries.is_empty());
    }
}
