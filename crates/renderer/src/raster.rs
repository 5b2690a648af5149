//! Typed RGBA raster operations.
//!
//! All rasters are `image::RgbaImage` (4 interleaved u8 channels, tightly
//! packed rows). Scaling is nearest-neighbour, matching a canvas with
//! smoothing disabled: destination pixel `d` samples source pixel
//! `floor(origin + (d + 0.5) * extent / dst_len)`. Samples that fall outside
//! the source are fully transparent.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Region of a source raster, in source pixels. May be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The whole of `raster`.
    pub fn full(raster: &RgbaImage) -> Self {
        Self::new(0.0, 0.0, raster.width() as f64, raster.height() as f64)
    }
}

/// Source index for each destination index along one axis.
fn sample_indices(origin: f64, extent: f64, dst_len: u32, src_len: u32) -> Vec<Option<u32>> {
    let step = extent / dst_len.max(1) as f64;
    (0..dst_len)
        .map(|d| {
            let s = (origin + (d as f64 + 0.5) * step).floor();
            if s >= 0.0 && s < src_len as f64 {
                Some(s as u32)
            } else {
                None
            }
        })
        .collect()
}

/// Overwrite every pixel of `dst` with `rect` of `src` scaled to fit.
///
/// Previous contents of `dst` are discarded, including where the sample
/// falls outside `src`.
pub fn draw_scaled_into(dst: &mut RgbaImage, src: &RgbaImage, rect: SourceRect) {
    let (dst_width, dst_height) = dst.dimensions();
    if dst_width == 0 || dst_height == 0 {
        return;
    }

    let cols = sample_indices(rect.x, rect.width, dst_width, src.width());
    let rows = sample_indices(rect.y, rect.height, dst_height, src.height());
    let row_len = dst_width as usize * 4;

    let buf: &mut [u8] = dst;
    buf.par_chunks_mut(row_len)
        .zip(rows.par_iter())
        .for_each(|(row, src_row)| {
            for (px, src_col) in row.chunks_exact_mut(4).zip(cols.iter()) {
                let value = match (src_row, src_col) {
                    (Some(sy), Some(sx)) => src.get_pixel(*sx, *sy).0,
                    _ => TRANSPARENT.0,
                };
                px.copy_from_slice(&value);
            }
        });
}

/// Crop `rect` out of `src` into a new `width` x `height` raster.
pub fn draw_scaled(src: &RgbaImage, rect: SourceRect, width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    draw_scaled_into(&mut out, src, rect);
    out
}

/// Apply `f` to every pixel in place.
pub fn map_pixels<F>(raster: &mut RgbaImage, f: F)
where
    F: Fn(Rgba<u8>) -> Rgba<u8> + Sync,
{
    let buf: &mut [u8] = raster;
    buf.par_chunks_exact_mut(4).for_each(|px| {
        let mapped = f(Rgba([px[0], px[1], px[2], px[3]]));
        px.copy_from_slice(&mapped.0);
    });
}

/// Source-over composite of `src` onto `dst`, anchored at the top-left.
///
/// Only the overlapping area is touched.
pub fn draw_over(dst: &mut RgbaImage, src: &RgbaImage) {
    let width = dst.width().min(src.width());
    let height = dst.height().min(src.height());

    for y in 0..height {
        for x in 0..width {
            let s = src.get_pixel(x, y);
            let d = dst.get_pixel_mut(x, y);
            *d = blend_over(*s, *d);
        }
    }
}

/// Straight-alpha source-over for one pixel.
pub fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    match sa {
        255 => src,
        0 => dst,
        _ => {
            let da = dst[3] as u32 * (255 - sa) / 255;
            let out_a = sa + da;
            let channel = |i: usize| -> u8 {
                ((src[i] as u32 * sa + dst[i] as u32 * da + out_a / 2) / out_a) as u8
            };
            Rgba([channel(0), channel(1), channel(2), out_a as u8])
        }
    }
}
