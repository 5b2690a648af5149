//! Palette reclassification of the raw reflectivity mosaic.
//!
//! The mosaic ships with a fixed palette plus background and legend colors.
//! Each rule maps one or more exact source RGB values to a display RGBA
//! value. Rules are checked in order and the first match wins; pixels that
//! match no rule keep all four channels.

use image::{Rgba, RgbaImage};

use crate::raster::map_pixels;

/// One reclassification rule.
#[derive(Debug, Clone, Copy)]
pub struct ColorRule {
    pub name: &'static str,
    pub sources: &'static [[u8; 3]],
    pub target: [u8; 4],
}

/// Mosaic palette to display palette, in priority order.
pub const COLOR_RULES: [ColorRule; 9] = [
    ColorRule {
        name: "transparent",
        sources: &[[0, 0, 0], [0, 236, 236], [1, 160, 246], [0, 0, 246]],
        target: [0, 0, 0, 0],
    },
    ColorRule {
        name: "light green 1",
        sources: &[[0, 255, 0]],
        target: [49, 210, 22, 255],
    },
    ColorRule {
        name: "light green 2",
        sources: &[[0, 200, 0]],
        target: [0, 142, 0, 255],
    },
    ColorRule {
        name: "dark green 1",
        sources: &[[0, 144, 0]],
        target: [20, 90, 15, 255],
    },
    ColorRule {
        name: "dark green 2",
        sources: &[[255, 255, 0]],
        target: [10, 40, 10, 255],
    },
    ColorRule {
        name: "yellow",
        sources: &[[231, 192, 0]],
        target: [196, 179, 70, 255],
    },
    ColorRule {
        name: "orange",
        sources: &[[255, 144, 0]],
        target: [190, 72, 19, 255],
    },
    ColorRule {
        name: "red",
        sources: &[[214, 0, 0], [255, 0, 0]],
        target: [171, 14, 14, 255],
    },
    ColorRule {
        name: "brown",
        sources: &[[192, 0, 0], [255, 0, 255]],
        target: [115, 31, 4, 255],
    },
];

/// Rule matching a source color, if any.
pub fn find_rule(rgb: [u8; 3]) -> Option<&'static ColorRule> {
    COLOR_RULES.iter().find(|rule| rule.sources.contains(&rgb))
}

/// Reclassify a single pixel.
pub fn reclassify_pixel(px: Rgba<u8>) -> Rgba<u8> {
    match find_rule([px[0], px[1], px[2]]) {
        Some(rule) => Rgba(rule.target),
        None => px,
    }
}

/// Reclassify every pixel of `raster` in place.
pub fn reclassify(raster: &mut RgbaImage) {
    map_pixels(raster, reclassify_pixel);
}
