//! Geo-referencing for the fixed radar rasters.
//!
//! The basemap and the raw reflectivity mosaic are each pinned to their own
//! origin and pixel-per-degree scale. The two grids are independent and
//! only meet when a frame is composited.

pub mod fixed_grid;

pub use fixed_grid::{doppler_offset, map_offset, FixedGrid, PixelOffset, BASEMAP_GRID, DOPPLER_GRID};
