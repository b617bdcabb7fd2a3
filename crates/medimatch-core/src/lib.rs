pub mod app_config;
pub mod config;
pub mod dictionary;
pub mod location;
pub mod provider;
pub mod seed;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use dictionary::{load_specialty_dictionary, DictionaryEntry, SpecialtyDictionaryFile};
pub use location::{Coordinate, LocationRecord, LocationSource};
pub use provider::{ProviderKind, ProviderRecord, SpecialtyFilterPolicy};
pub use seed::{load_provider_seed, normalize_specialties, ProviderSeed, ProviderSeedFile};

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: &'static str,
    },
    #[error("invalid provider kind: {0}")]
    InvalidProviderKind(String),
    #[error("invalid specialty filter policy: {0}")]
    InvalidSpecialtyPolicy(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
