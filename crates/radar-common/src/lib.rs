//! Common types and utilities shared across the radar loop crates.

pub mod error;
pub mod geo;
pub mod status;
pub mod time;

pub use error::{RadarError, RadarResult};
pub use geo::{BasemapKind, GeoPosition, DEFAULT_EXCLUDED_REGIONS};
pub use status::RadarStatus;
pub use time::{format_time_simple, listing_days, listing_path, timestamp_from_filename, timestamp_from_last_modified};
