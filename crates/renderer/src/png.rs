//! PNG encoding and decoding for radar rasters.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, ImageResult, RgbaImage};
use radar_common::{RadarError, RadarResult};

/// Encode a raster as an RGBA PNG.
pub fn encode_png(raster: &RgbaImage) -> RadarResult<Vec<u8>> {
    let mut out = Vec::with_capacity(raster.as_raw().len() / 4);
    PngEncoder::new(&mut out)
        .write_image(raster.as_raw(), raster.width(), raster.height(), ColorType::Rgba8)
        .map_err(|e| RadarError::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(out)
}

/// Decode a PNG payload to RGBA, whatever its stored color type.
///
/// The mosaic is published as an indexed PNG; it is expanded here.
pub fn decode_png(bytes: &[u8]) -> ImageResult<RgbaImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    Ok(image.to_rgba8())
}

/// Decode any supported raster format (the basemap is a JPEG).
pub fn decode_any(bytes: &[u8]) -> ImageResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
