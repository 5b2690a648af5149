//! Observer location and region handling.

use serde::{Deserialize, Serialize};

/// Region codes the reflectivity mosaic does not cover.
pub const DEFAULT_EXCLUDED_REGIONS: [&str; 2] = ["AK", "HI"];

/// Location the radar loop is centered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Two-letter state/territory code (e.g. "MO")
    #[serde(rename = "region")]
    pub region_code: String,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, region_code: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            region_code: region_code.into(),
        }
    }

    /// Check the region against an exclusion list (case-insensitive).
    pub fn is_excluded<S: AsRef<str>>(&self, excluded: &[S]) -> bool {
        excluded
            .iter()
            .any(|code| code.as_ref().eq_ignore_ascii_case(self.region_code.trim()))
    }

    /// Basemap this position is drawn on.
    pub fn basemap_kind(&self) -> BasemapKind {
        if self.region_code.trim().eq_ignore_ascii_case("HI") {
            BasemapKind::Hawaii
        } else {
            BasemapKind::Continental
        }
    }

    /// Key identifying this position for single-flight acquisition.
    pub fn flight_key(&self) -> String {
        format!(
            "{:.4},{:.4},{}",
            self.latitude,
            self.longitude,
            self.region_code.trim().to_ascii_uppercase()
        )
    }
}

/// Which static background raster a frame is composited onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasemapKind {
    Continental,
    Hawaii,
}

impl BasemapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasemapKind::Continental => "continental",
            BasemapKind::Hawaii => "hawaii",
        }
    }
}
