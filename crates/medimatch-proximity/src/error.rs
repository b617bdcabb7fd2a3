use medimatch_core::CoreError;
use thiserror::Error;

/// Failures raised by a [`crate::ProviderDirectory`] implementation.
///
/// The engine logs these and treats the tier as empty.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory {operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DirectoryError {
    #[must_use]
    pub fn backend(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

/// Caller input rejected before any directory call is made.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error("limit must be greater than zero")]
    InvalidLimit,
    #[error(transparent)]
    InvalidCoordinate(#[from] CoreError),
}
