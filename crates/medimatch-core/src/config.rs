use crate::app_config::{AppConfig, Environment};
use crate::provider::SpecialtyFilterPolicy;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
#[allow(clippy::too_many_lines)]
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let positive_km = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value: f64 = parse_as(var, &or_default(var, default))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "{var} must be a positive number of kilometres, got {value}"
            )));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("MEDIMATCH_ENV", "development"));

    let bind_addr: SocketAddr = parse_as(
        "MEDIMATCH_BIND_ADDR",
        &or_default("MEDIMATCH_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("MEDIMATCH_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_as(
        "MEDIMATCH_DB_MAX_CONNECTIONS",
        &or_default("MEDIMATCH_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "MEDIMATCH_DB_MIN_CONNECTIONS",
        &or_default("MEDIMATCH_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "MEDIMATCH_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("MEDIMATCH_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let default_radius_km = positive_km("MEDIMATCH_DEFAULT_RADIUS_KM", "10")?;
    let city_estimate_km = positive_km("MEDIMATCH_CITY_ESTIMATE_KM", "5")?;
    let region_estimate_km = positive_km("MEDIMATCH_REGION_ESTIMATE_KM", "25")?;

    let default_limit: usize = parse_as(
        "MEDIMATCH_DEFAULT_LIMIT",
        &or_default("MEDIMATCH_DEFAULT_LIMIT", "10"),
    )?;
    let max_limit: usize = parse_as(
        "MEDIMATCH_MAX_LIMIT",
        &or_default("MEDIMATCH_MAX_LIMIT", "50"),
    )?;
    if default_limit == 0 || max_limit == 0 {
        return Err(ConfigError::Validation(
            "MEDIMATCH_DEFAULT_LIMIT and MEDIMATCH_MAX_LIMIT must be at least 1".to_string(),
        ));
    }
    if default_limit > max_limit {
        return Err(ConfigError::Validation(format!(
            "MEDIMATCH_DEFAULT_LIMIT ({default_limit}) exceeds MEDIMATCH_MAX_LIMIT ({max_limit})"
        )));
    }

    let tier_timeout_ms: u64 = parse_as(
        "MEDIMATCH_TIER_TIMEOUT_MS",
        &or_default("MEDIMATCH_TIER_TIMEOUT_MS", "2500"),
    )?;

    let specialty_policy: SpecialtyFilterPolicy = parse_as(
        "MEDIMATCH_SPECIALTY_POLICY",
        &or_default("MEDIMATCH_SPECIALTY_POLICY", "preference"),
    )?;
    let specialty_dictionary_path = lookup("MEDIMATCH_SPECIALTY_DICTIONARY_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let geolocation_base_url = or_default("MEDIMATCH_GEOLOCATION_BASE_URL", "http://ip-api.com");
    let geolocation_timeout_secs: u64 = parse_as(
        "MEDIMATCH_GEOLOCATION_TIMEOUT_SECS",
        &or_default("MEDIMATCH_GEOLOCATION_TIMEOUT_SECS", "5"),
    )?;

    let reverse_geocode_enabled = parse_bool(
        "MEDIMATCH_REVERSE_GEOCODE_ENABLED",
        &or_default("MEDIMATCH_REVERSE_GEOCODE_ENABLED", "false"),
    )?;
    let reverse_geocode_base_url = or_default(
        "MEDIMATCH_REVERSE_GEOCODE_BASE_URL",
        "https://nominatim.openstreetmap.org",
    );
    let geocode_cache_capacity: usize = parse_as(
        "MEDIMATCH_GEOCODE_CACHE_CAPACITY",
        &or_default("MEDIMATCH_GEOCODE_CACHE_CAPACITY", "1024"),
    )?;
    let geocode_cache_ttl_secs: u64 = parse_as(
        "MEDIMATCH_GEOCODE_CACHE_TTL_SECS",
        &or_default("MEDIMATCH_GEOCODE_CACHE_TTL_SECS", "3600"),
    )?;

    let http_max_retries: u32 = parse_as(
        "MEDIMATCH_HTTP_MAX_RETRIES",
        &or_default("MEDIMATCH_HTTP_MAX_RETRIES", "2"),
    )?;
    let user_agent = or_default("MEDIMATCH_USER_AGENT", "medimatch/0.1 (provider-matching)");
    let rate_limit_per_minute: usize = parse_as(
        "MEDIMATCH_RATE_LIMIT_PER_MINUTE",
        &or_default("MEDIMATCH_RATE_LIMIT_PER_MINUTE", "120"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        default_radius_km,
        default_limit,
        max_limit,
        tier_timeout_ms,
        city_estimate_km,
        region_estimate_km,
        specialty_policy,
        specialty_dictionary_path,
        geolocation_base_url,
        geolocation_timeout_secs,
        reverse_geocode_enabled,
        reverse_geocode_base_url,
        geocode_cache_capacity,
        geocode_cache_ttl_secs,
        http_max_retries,
        user_agent,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
