//! In-memory archive and engine builders shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use radar_common::{GeoPosition, RadarStatus};
use radar_loop::config::BasemapConfig;
use radar_loop::{ArchiveClient, FetchError, FetchedImage, PlaybackScheduler, RadarConfig, RadarEngine};
use test_utils::{encode_png, solid_raster};

/// Light basemap pixel; radar draws over it.
pub const LIGHT: [u8; 4] = [200, 190, 170, 255];

/// Raw mosaic green, displayed as (49, 210, 22).
pub const MOSAIC_GREEN: [u8; 4] = [0, 255, 0, 255];

/// A position whose viewports both pin to the raster origin, so small
/// synthetic basemaps cover the crop.
pub fn northwest() -> GeoPosition {
    GeoPosition::new(51.0, -129.5, "WA")
}

/// Archive served from memory, counting every request.
#[derive(Default)]
pub struct FakeArchive {
    listings: HashMap<String, Result<String, u16>>,
    images: HashMap<String, Result<FetchedImage, u16>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, url: &str, html: String) -> Self {
        self.listings.insert(url.to_string(), Ok(html));
        self
    }

    pub fn with_listing_status(mut self, url: &str, status: u16) -> Self {
        self.listings.insert(url.to_string(), Err(status));
        self
    }

    pub fn with_image(mut self, url: &str, png: Vec<u8>, last_modified: Option<&str>) -> Self {
        self.images.insert(
            url.to_string(),
            Ok(FetchedImage {
                bytes: Bytes::from(png),
                last_modified: last_modified.map(str::to_string),
            }),
        );
        self
    }

    pub fn with_image_status(mut self, url: &str, status: u16) -> Self {
        self.images.insert(url.to_string(), Err(status));
        self
    }

    /// Serve a mosaic for every name under `listing_url`.
    pub fn with_mosaics(mut self, listing_url: &str, names: &[String]) -> Self {
        let png = mosaic_png();
        for name in names {
            self = self.with_image(&format!("{}{}", listing_url, name), png.clone(), None);
        }
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond<T: Clone>(&self, url: &str, table: &HashMap<String, Result<T, u16>>) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match table.get(url) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Status(404)),
        }
    }
}

#[async_trait]
impl ArchiveClient for FakeArchive {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.respond(url, &self.listings).await
    }

    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.respond(url, &self.images).await
    }
}

/// Small all-green mosaic; scaled up to the working canvas when drawn.
pub fn mosaic_png() -> Vec<u8> {
    encode_png(&solid_raster(255, 160, MOSAIC_GREEN))
}

/// Write a light basemap covering the north-west crop.
pub fn write_basemap(dir: &Path) -> BasemapConfig {
    let continental = dir.join("basemap.png");
    std::fs::write(&continental, encode_png(&solid_raster(480, 276, LIGHT))).unwrap();
    BasemapConfig {
        continental,
        hawaii: dir.join("hawaii.png"),
    }
}

pub fn test_config(basemaps: BasemapConfig) -> RadarConfig {
    let mut config = RadarConfig::from_yaml(
        "location: { latitude: 51.0, longitude: -129.5, region: WA }\n",
    )
    .unwrap();
    config.basemaps = basemaps;
    config
}

/// Every status change, in order.
pub type StatusLog = Arc<Mutex<Vec<RadarStatus>>>;

pub fn build_engine(config: &RadarConfig, archive: Arc<dyn ArchiveClient>) -> (RadarEngine, StatusLog) {
    let log: StatusLog = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let playback = PlaybackScheduler::new(&config.playback)
        .with_listener(Arc::new(move |status: RadarStatus| sink.lock().unwrap().push(status)))
        .shared();

    (RadarEngine::new(config, archive, playback), log)
}

pub fn count(log: &StatusLog, status: RadarStatus) -> usize {
    log.lock().unwrap().iter().filter(|s| **s == status).count()
}
