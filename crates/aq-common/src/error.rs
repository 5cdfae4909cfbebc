//! Error types for the surface engine.

use thiserror::Error;

/// Result type alias using SurfaceError.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Primary error type for interpolation runs and their inputs.
#[derive(Debug, Error)]
pub enum SurfaceError {
    // === Input Errors ===
    #[error("Insufficient station data: {0}")]
    InsufficientStationData(String),

    #[error("Invalid grid resolution {0}: at least 2 sites per axis are required")]
    InvalidResolution(usize),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Model Errors ===
    #[error("Interpolation failed: {0}")]
    InterpolationFailure(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SurfaceError {
    /// Create an InsufficientStationData error.
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientStationData(msg.into())
    }

    /// Create a ProjectionError.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::ProjectionError(msg.into())
    }

    /// Create an InvalidBoundary error.
    pub fn invalid_boundary(msg: impl Into<String>) -> Self {
        Self::InvalidBoundary(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller may succeed by retrying later with fresh data.
    ///
    /// Only a short station batch qualifies; everything else is either a
    /// caller mistake or a hard numerical failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SurfaceError::InsufficientStationData(_))
    }
}

impl From<serde_json::Error> for SurfaceError {
    fn from(err: serde_json::Error) -> Self {
        SurfaceError::InvalidInput(format!("JSON error: {}", err))
    }
}
