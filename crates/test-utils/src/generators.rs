//! Raster generators for creating synthetic radar-like images.
//!
//! These generators create predictable, verifiable pixel patterns that can
//! be used across the test suite.

use std::io::Cursor;

use image::{ImageOutputFormat, Rgba, RgbaImage};

/// Source colors of the raw mosaic palette, in reclassification order.
pub const MOSAIC_COLORS: [[u8; 3]; 14] = [
    [0, 0, 0],
    [0, 236, 236],
    [1, 160, 246],
    [0, 0, 246],
    [0, 255, 0],
    [0, 200, 0],
    [0, 144, 0],
    [255, 255, 0],
    [231, 192, 0],
    [255, 144, 0],
    [214, 0, 0],
    [255, 0, 0],
    [192, 0, 0],
    [255, 0, 255],
];

/// Creates a raster filled with one color.
pub fn solid_raster(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Creates a raster with vertical stripes of every mosaic palette color.
///
/// Column `x` holds `MOSAIC_COLORS[x % 14]`, fully opaque.
pub fn mosaic_stripes(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        let [r, g, b] = MOSAIC_COLORS[x as usize % MOSAIC_COLORS.len()];
        Rgba([r, g, b, 255])
    })
}

/// Creates a basemap-like raster: dark left half, light right half.
///
/// The dark half (RGB 40,40,60) is below the masking threshold; the light
/// half (RGB 200,190,170) is above it.
pub fn split_basemap(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([40, 40, 60, 255])
        } else {
            Rgba([200, 190, 170, 255])
        }
    })
}

/// Creates a raster whose pixels encode their position.
///
/// Red = x mod 256, green = y mod 256, blue = 7, alpha = 255.
pub fn coordinate_raster(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]))
}

/// PNG-encode a raster, as served by the archive.
pub fn encode_png(raster: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    raster
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("in-memory PNG encoding cannot fail");
    out.into_inner()
}
