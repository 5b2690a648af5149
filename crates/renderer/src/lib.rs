//! Raster processing for radar frames.
//!
//! Implements the per-frame pipeline:
//! - Nearest-neighbour scaled crops of typed RGBA rasters
//! - Palette reclassification of the raw reflectivity mosaic
//! - Darkness masking against the basemap
//! - Alpha compositing and PNG encoding

pub mod composite;
pub mod png;
pub mod raster;
pub mod reclassify;

pub use composite::{FrameCompositor, Viewport, FRAME_HEIGHT, FRAME_WIDTH};
pub use raster::SourceRect;
