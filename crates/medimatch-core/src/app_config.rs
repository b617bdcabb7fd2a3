use std::net::SocketAddr;
use std::path::PathBuf;

use crate::provider::SpecialtyFilterPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub default_radius_km: f64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub tier_timeout_ms: u64,
    pub city_estimate_km: f64,
    pub region_estimate_km: f64,
    pub specialty_policy: SpecialtyFilterPolicy,
    pub specialty_dictionary_path: Option<PathBuf>,
    pub geolocation_base_url: String,
    pub geolocation_timeout_secs: u64,
    pub reverse_geocode_enabled: bool,
    pub reverse_geocode_base_url: String,
    pub geocode_cache_capacity: usize,
    pub geocode_cache_ttl_secs: u64,
    pub http_max_retries: u32,
    pub user_agent: String,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("default_radius_km", &self.default_radius_km)
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .field("tier_timeout_ms", &self.tier_timeout_ms)
            .field("city_estimate_km", &self.city_estimate_km)
            .field("region_estimate_km", &self.region_estimate_km)
            .field("specialty_policy", &self.specialty_policy)
            .field("specialty_dictionary_path", &self.specialty_dictionary_path)
            .field("geolocation_base_url", &self.geolocation_base_url)
            .field("geolocation_timeout_secs", &self.geolocation_timeout_secs)
            .field("reverse_geocode_enabled", &self.reverse_geocode_enabled)
            .field("reverse_geocode_base_url", &self.reverse_geocode_base_url)
            .field("geocode_cache_capacity", &self.geocode_cache_capacity)
            .field("geocode_cache_ttl_secs", &self.geocode_cache_ttl_secs)
            .field("http_max_retries", &self.http_max_retries)
            .field("user_agent", &self.user_agent)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
