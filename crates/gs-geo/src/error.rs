//! Error types for gs-geo.

use thiserror::Error;

/// Errors raised while loading track or fence geometry.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is not a FeatureCollection")]
    NotFeatureCollection,

    #[error("feature {index} is invalid: {reason}")]
    InvalidFeature { index: usize, reason: String },

    #[error("feature collection contains no polygon geometry")]
    NoPolygons,
}

impl GeoError {
    pub(crate) fn invalid_feature(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidFeature { index, reason: reason.into() }
    }
}

/// Alias for `Result<T, GeoError>`.
pub type GeoResult<T> = Result<T, GeoError>;
