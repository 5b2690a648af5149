//! Process-lifetime cache of the static background rasters.
//!
//! Each basemap is decoded the first time a cycle needs it and shared
//! read-only afterwards. A failed load leaves the slot empty so the next
//! cycle tries again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use radar_common::{BasemapKind, RadarError, RadarResult};
use renderer::png::decode_any;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::BasemapConfig;

pub struct BasemapCache {
    continental_path: PathBuf,
    hawaii_path: PathBuf,
    continental: OnceCell<Arc<RgbaImage>>,
    hawaii: OnceCell<Arc<RgbaImage>>,
}

impl BasemapCache {
    pub fn new(config: &BasemapConfig) -> Self {
        Self {
            continental_path: config.continental.clone(),
            hawaii_path: config.hawaii.clone(),
            continental: OnceCell::new(),
            hawaii: OnceCell::new(),
        }
    }

    fn slot(&self, kind: BasemapKind) -> (&OnceCell<Arc<RgbaImage>>, &Path) {
        match kind {
            BasemapKind::Continental => (&self.continental, &self.continental_path),
            BasemapKind::Hawaii => (&self.hawaii, &self.hawaii_path),
        }
    }

    /// The basemap for `kind`, loading it on first use.
    pub async fn get(&self, kind: BasemapKind) -> RadarResult<Arc<RgbaImage>> {
        let (cell, path) = self.slot(kind);
        let basemap = cell.get_or_try_init(|| load_basemap(kind, path)).await?;
        Ok(Arc::clone(basemap))
    }

    pub fn is_loaded(&self, kind: BasemapKind) -> bool {
        self.slot(kind).0.initialized()
    }
}

async fn load_basemap(kind: BasemapKind, path: &Path) -> RadarResult<Arc<RgbaImage>> {
    let basemap_error = |message: String| RadarError::Basemap {
        path: path.display().to_string(),
        message,
    };

    let bytes = tokio::fs::read(path).await.map_err(|e| basemap_error(e.to_string()))?;
    let raster = tokio::task::spawn_blocking(move || decode_any(&bytes))
        .await
        .map_err(|e| basemap_error(format!("decode task failed: {}", e)))?
        .map_err(|e| basemap_error(e.to_string()))?;

    info!(
        kind = kind.as_str(),
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        "Loaded basemap"
    );

    Ok(Arc::new(raster))
}
