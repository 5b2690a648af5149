//! Linear lat/lon to pixel mapping for rasters with fixed georeferencing.
//!
//! Each grid is described by:
//! - Origin: the latitude/longitude of pixel (0, 0)
//! - Scale: pixels per degree of latitude and of longitude
//! - Dimensions: width and height of the reference raster
//!
//! An offset is the top-left corner of a viewport centered on a position.
//! The corner is clamped so the viewport (`2 * margin` on each axis) never
//! leaves the raster, then doubled because both rasters are addressed at 2x
//! their reference resolution.

use radar_common::GeoPosition;
use serde::Serialize;

/// Georeferencing constants for one raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGrid {
    /// Latitude of the top edge (degrees)
    pub origin_lat: f64,
    /// Longitude of the left edge (degrees)
    pub origin_lon: f64,
    /// Pixels per degree of latitude
    pub px_per_deg_lat: f64,
    /// Pixels per degree of longitude
    pub px_per_deg_lon: f64,
    /// Reference width in pixels
    pub width: f64,
    /// Reference height in pixels
    pub height: f64,
}

/// Continental basemap (5100x3200 reference).
pub const BASEMAP_GRID: FixedGrid = FixedGrid {
    origin_lat: 51.75,
    origin_lon: -130.37,
    px_per_deg_lat: 55.2,
    px_per_deg_lon: 41.775,
    width: 5100.0,
    height: 3200.0,
};

/// Raw reflectivity mosaic (2800x6000 reference).
pub const DOPPLER_GRID: FixedGrid = FixedGrid {
    origin_lat: 51.0,
    origin_lon: -129.138,
    px_per_deg_lat: 61.4481,
    px_per_deg_lon: 42.1768,
    width: 2800.0,
    height: 6000.0,
};

/// Pixel coordinate of a viewport corner, at 2x reference resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelOffset {
    pub x: f64,
    pub y: f64,
}

impl PixelOffset {
    /// Back to reference resolution.
    pub fn halved(self) -> Self {
        Self {
            x: self.x / 2.0,
            y: self.y / 2.0,
        }
    }
}

impl FixedGrid {
    /// Unclamped pixel position of a coordinate in reference resolution.
    pub fn project(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let x = (longitude - self.origin_lon) * self.px_per_deg_lon;
        let y = (self.origin_lat - latitude) * self.px_per_deg_lat;
        (x, y)
    }

    /// Top-left corner of a viewport centered on `pos`.
    ///
    /// `margin_x`/`margin_y` are half the viewport size in reference pixels.
    pub fn offset(&self, pos: &GeoPosition, margin_x: f64, margin_y: f64) -> PixelOffset {
        let (x, y) = self.project(pos.latitude, pos.longitude);

        let x = clamp_axis(x - margin_x, self.width, margin_x);
        let y = clamp_axis(y - margin_y, self.height, margin_y);

        PixelOffset { x: x * 2.0, y: y * 2.0 }
    }
}

/// Keep `value` inside `[0, dimension - 2 * margin]`.
///
/// A viewport larger than the raster pins to 0.
fn clamp_axis(value: f64, dimension: f64, margin: f64) -> f64 {
    let max = dimension - margin * 2.0;
    if value > max {
        max.max(0.0)
    } else if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Viewport corner in basemap space.
pub fn map_offset(pos: &GeoPosition, margin_x: f64, margin_y: f64) -> PixelOffset {
    BASEMAP_GRID.offset(pos, margin_x, margin_y)
}

/// Viewport corner in doppler source space.
pub fn doppler_offset(pos: &GeoPosition, margin_x: f64, margin_y: f64) -> PixelOffset {
    DOPPLER_GRID.offset(pos, margin_x, margin_y)
}
