//! Frame compositing: basemap background plus masked radar overlay.
//!
//! Per source mosaic:
//! 1. Draw the whole mosaic into the working canvas (replacing it)
//! 2. Crop the basemap around the position (background)
//! 3. Crop the working canvas around the position (overlay)
//! 4. Reclassify the overlay palette
//! 5. Clear overlay pixels that sit on dark basemap pixels
//! 6. Draw the overlay over the background
//!
//! Both crops are computed from the same margins so the two coordinate
//! spaces stay pixel-aligned.

use image::{Rgba, RgbaImage};
use projection::{doppler_offset, map_offset};
use radar_common::GeoPosition;
use tracing::debug;

use crate::raster::{draw_over, draw_scaled, draw_scaled_into, SourceRect, TRANSPARENT};
use crate::reclassify::reclassify;

/// Finished frame width in pixels.
pub const FRAME_WIDTH: u32 = 640;
/// Finished frame height in pixels.
pub const FRAME_HEIGHT: u32 = 367;

/// Working canvas the full mosaic is drawn into.
pub const WORKING_WIDTH: u32 = 2550;
pub const WORKING_HEIGHT: u32 = 1600;

/// Half the viewport size used for both projections.
pub const VIEW_MARGIN_X: f64 = 240.0;
pub const VIEW_MARGIN_Y: f64 = 138.0;

/// Size of the overlay crop taken from the working canvas.
pub const RADAR_CROP_WIDTH: f64 = 240.0;
pub const RADAR_CROP_HEIGHT: f64 = 70.0 * 2.33;

/// Basemap channels below this value count as dark.
pub const DARK_THRESHOLD: u8 = 116;

/// Whether a basemap pixel is dark background (ocean, borders, legend).
pub fn is_dark(px: &Rgba<u8>) -> bool {
    px[0] < DARK_THRESHOLD && px[1] < DARK_THRESHOLD && px[2] < DARK_THRESHOLD
}

/// Make every overlay pixel above a dark basemap pixel fully transparent.
///
/// Applying it twice is the same as applying it once.
pub fn mask_dark_regions(overlay: &mut RgbaImage, basemap: &RgbaImage) {
    for (px, base) in overlay.pixels_mut().zip(basemap.pixels()) {
        if is_dark(base) {
            *px = TRANSPARENT;
        }
    }
}

/// Crop rectangles for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Region of the basemap
    pub map: SourceRect,
    /// Region of the working canvas
    pub radar: SourceRect,
}

impl Viewport {
    pub fn for_position(pos: &GeoPosition) -> Self {
        let map = map_offset(pos, VIEW_MARGIN_X, VIEW_MARGIN_Y);
        let radar = doppler_offset(pos, VIEW_MARGIN_X, VIEW_MARGIN_Y).halved();

        Self {
            map: SourceRect::new(map.x, map.y, VIEW_MARGIN_X * 2.0, VIEW_MARGIN_Y * 2.0),
            radar: SourceRect::new(radar.x, radar.y, RADAR_CROP_WIDTH, RADAR_CROP_HEIGHT),
        }
    }
}

/// Composites frames for a single position, reusing one working canvas.
#[derive(Debug)]
pub struct FrameCompositor {
    viewport: Viewport,
    working: RgbaImage,
}

impl FrameCompositor {
    pub fn new(pos: &GeoPosition) -> Self {
        Self {
            viewport: Viewport::for_position(pos),
            working: RgbaImage::new(WORKING_WIDTH, WORKING_HEIGHT),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Background crop of the basemap.
    pub fn basemap_crop(&self, basemap: &RgbaImage) -> RgbaImage {
        draw_scaled(basemap, self.viewport.map, FRAME_WIDTH, FRAME_HEIGHT)
    }

    /// Reclassified overlay crop of a source mosaic (steps 1, 3 and 4).
    pub fn radar_overlay(&mut self, source: &RgbaImage) -> RgbaImage {
        draw_scaled_into(&mut self.working, source, SourceRect::full(source));

        let mut overlay = draw_scaled(&self.working, self.viewport.radar, FRAME_WIDTH, FRAME_HEIGHT);
        reclassify(&mut overlay);
        overlay
    }

    /// Produce the finished 640x367 frame for one source mosaic.
    pub fn composite(&mut self, basemap: &RgbaImage, source: &RgbaImage) -> RgbaImage {
        let mut frame = self.basemap_crop(basemap);
        let mut overlay = self.radar_overlay(source);

        mask_dark_regions(&mut overlay, &frame);
        draw_over(&mut frame, &overlay);

        debug!(
            source_width = source.width(),
            source_height = source.height(),
            map_x = self.viewport.map.x,
            map_y = self.viewport.map.y,
            "Composited radar frame"
        );

        frame
    }
}
