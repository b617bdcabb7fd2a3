use thiserror::Error;

/// Errors returned by the geolocation and reverse-geocoding collaborators.
///
/// None of these escape the [`crate::LocationResolver`]; they are logged and
/// replaced by the default location or an unenriched record.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but reported a failed lookup.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
