//! Error types for the radar loop.

use thiserror::Error;

use crate::status::RadarStatus;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for radar acquisition and rendering.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Acquisition Errors ===
    #[error("Region not supported: {0}")]
    UnsupportedRegion(String),

    #[error("Unable to get list of radars from {url}: {message}")]
    ListingRetrieval { url: String, message: String },

    #[error("Unable to fetch radar image {url}: {message}")]
    ImageRetrieval { url: String, message: String },

    #[error("Failed to decode radar image {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to load basemap {path}: {message}")]
    Basemap { path: String, message: String },

    #[error("Acquisition already in flight for {0}")]
    AcquisitionInFlight(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RadarError {
    /// Whether this error ends the acquisition cycle.
    ///
    /// Listing failures are absorbed at the listing fan-in, and an unsupported
    /// region or a rejected concurrent call never started a cycle.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RadarError::ListingRetrieval { .. }
                | RadarError::UnsupportedRegion(_)
                | RadarError::AcquisitionInFlight(_)
        )
    }

    /// Terminal status a cycle ends in when this error surfaces.
    ///
    /// Returns `None` when the error does not affect the status at all.
    pub fn cycle_status(&self) -> Option<RadarStatus> {
        match self {
            RadarError::UnsupportedRegion(_) => Some(RadarStatus::NoData),
            RadarError::AcquisitionInFlight(_) => None,
            _ => Some(RadarStatus::Failed),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RadarError::UnsupportedRegion(_) => 404,
            RadarError::AcquisitionInFlight(_) => 409,
            RadarError::ListingRetrieval { .. } | RadarError::ImageRetrieval { .. } => 502,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::Config(format!("JSON error: {}", err))
    }
}
