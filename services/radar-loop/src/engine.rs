//! Acquisition pipeline: listings, fetch, composite, publish.
//!
//! One cycle:
//! 1. Reject excluded regions (no network activity)
//! 2. Load the basemap (cached for the process lifetime)
//! 3. Read yesterday's and today's listings concurrently, tolerating failures
//! 4. Keep the most recent candidates
//! 5. Fetch and decode them concurrently; any failure aborts the cycle
//! 6. Composite every frame on a blocking thread
//! 7. Sort by timestamp and publish to the playback scheduler
//!
//! Only one cycle runs at a time per engine.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use radar_common::{GeoPosition, RadarError, RadarResult, RadarStatus};
use renderer::FrameCompositor;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::ArchiveClient;
use crate::basemap::BasemapCache;
use crate::config::{ArchiveConfig, RadarConfig};
use crate::fetch::{fetch_all, DecodedImage};
use crate::frame::RadarFrame;
use crate::listing::{listing_urls, resolve_candidates, select_recent};
use crate::playback::SharedPlayback;

/// Summary of a finished cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub status: RadarStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub listing_failures: usize,
    pub candidates: usize,
    pub frames: usize,
    pub error: Option<String>,
}

/// Marks the engine busy for the lifetime of one cycle.
///
/// The engine owns a single frame set and playback scheduler, so at most one
/// cycle runs at a time regardless of position.
struct FlightGuard<'a> {
    in_flight: &'a Mutex<Option<String>>,
}

impl<'a> FlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<Option<String>>, key: String) -> RadarResult<Self> {
        let mut running = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(active) = running.as_ref() {
            debug!(requested = %key, active = %active, "Rejecting overlapping acquisition");
            return Err(RadarError::AcquisitionInFlight(key));
        }
        *running = Some(key);
        Ok(Self { in_flight })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut running = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *running = None;
    }
}

/// Counters gathered while a cycle runs.
#[derive(Debug, Default)]
struct CycleProgress {
    listing_failures: usize,
    candidates: usize,
}

pub struct RadarEngine {
    client: Arc<dyn ArchiveClient>,
    basemaps: BasemapCache,
    archive: ArchiveConfig,
    excluded_regions: Vec<String>,
    max_images: usize,
    playback: SharedPlayback,
    in_flight: Mutex<Option<String>>,
    last_cycle: RwLock<Option<CycleReport>>,
}

impl RadarEngine {
    pub fn new(config: &RadarConfig, client: Arc<dyn ArchiveClient>, playback: SharedPlayback) -> Self {
        Self {
            client,
            basemaps: BasemapCache::new(&config.basemaps),
            archive: config.archive.clone(),
            excluded_regions: config.regions.excluded.clone(),
            max_images: config.frames.max_images,
            playback,
            in_flight: Mutex::new(None),
            last_cycle: RwLock::new(None),
        }
    }

    pub fn playback(&self) -> &SharedPlayback {
        &self.playback
    }

    pub fn basemaps(&self) -> &BasemapCache {
        &self.basemaps
    }

    pub async fn last_cycle(&self) -> Option<CycleReport> {
        self.last_cycle.read().await.clone()
    }

    /// Run one acquisition cycle for `pos` using the current time.
    pub async fn acquire(&self, pos: &GeoPosition) -> RadarResult<CycleReport> {
        self.acquire_at(pos, Utc::now()).await
    }

    /// Run one acquisition cycle with listings chosen relative to `now`.
    ///
    /// Fatal errors are returned after the status has been set. An excluded
    /// region and a degraded listing still produce a report. A degraded cycle
    /// publishes its frames for `/frames`, but its `Failed` status keeps them
    /// out of playback.
    #[instrument(skip(self, pos, now), fields(region = %pos.region_code))]
    pub async fn acquire_at(&self, pos: &GeoPosition, now: DateTime<Utc>) -> RadarResult<CycleReport> {
        let _guard = FlightGuard::acquire(&self.in_flight, pos.flight_key())?;

        let started = Instant::now();
        self.playback.write().await.begin_cycle();

        let mut progress = CycleProgress::default();
        let result = self.run_cycle(pos, now, &mut progress).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (status, frames, error) = match result {
            Ok(frames) => {
                let count = frames.len();
                let mut playback = self.playback.write().await;
                playback.publish(frames);
                playback.set_status(RadarStatus::Loaded);
                (playback.status(), count, None)
            }
            Err(e) => {
                match &e {
                    RadarError::UnsupportedRegion(_) => info!(error = %e, "Radar not available for region"),
                    _ => error!(error = %e, "Radar acquisition failed"),
                }

                let mut playback = self.playback.write().await;
                playback.clear();
                if let Some(status) = e.cycle_status() {
                    playback.set_status(status);
                }
                let status = playback.status();
                drop(playback);

                if e.is_fatal() {
                    self.record(status, now, duration_ms, &progress, 0, Some(e.to_string())).await;
                    return Err(e);
                }
                (status, 0, Some(e.to_string()))
            }
        };

        Ok(self.record(status, now, duration_ms, &progress, frames, error).await)
    }

    async fn record(
        &self,
        status: RadarStatus,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        progress: &CycleProgress,
        frames: usize,
        error: Option<String>,
    ) -> CycleReport {
        counter!("radar_cycles_total", "outcome" => status.as_str()).increment(1);
        histogram!("radar_cycle_duration_ms").record(duration_ms as f64);

        let report = CycleReport {
            status,
            started_at,
            duration_ms,
            listing_failures: progress.listing_failures,
            candidates: progress.candidates,
            frames,
            error,
        };

        info!(
            status = %report.status,
            frames = report.frames,
            candidates = report.candidates,
            listing_failures = report.listing_failures,
            duration_ms = report.duration_ms,
            "Radar cycle complete"
        );

        *self.last_cycle.write().await = Some(report.clone());
        report
    }

    async fn run_cycle(
        &self,
        pos: &GeoPosition,
        now: DateTime<Utc>,
        progress: &mut CycleProgress,
    ) -> RadarResult<Vec<RadarFrame>> {
        if pos.is_excluded(&self.excluded_regions) {
            return Err(RadarError::UnsupportedRegion(pos.region_code.clone()));
        }

        let basemap = self.basemaps.get(pos.basemap_kind()).await?;

        let urls = listing_urls(&self.archive, now);
        let listing = resolve_candidates(self.client.as_ref(), &urls, &self.archive.product_marker).await;
        progress.listing_failures = listing.failures.len();
        progress.candidates = listing.candidates.len();

        if listing.degraded() {
            warn!(failed = listing.failures.len(), "Continuing with partial radar listings");
            self.playback.write().await.set_status(RadarStatus::Failed);
        }

        let selected = select_recent(listing.candidates, self.max_images);
        let images = fetch_all(self.client.as_ref(), &selected).await?;

        let pos = pos.clone();
        let mut frames = tokio::task::spawn_blocking(move || composite_all(&pos, &basemap, images))
            .await
            .map_err(|e| RadarError::Render(format!("compositing task failed: {}", e)))??;

        frames.sort_by_key(|frame| frame.timestamp);
        Ok(frames)
    }
}

/// Composite decoded mosaics into frames, reusing one working canvas.
fn composite_all(
    pos: &GeoPosition,
    basemap: &image::RgbaImage,
    images: Vec<DecodedImage>,
) -> RadarResult<Vec<RadarFrame>> {
    let mut compositor = FrameCompositor::new(pos);

    images
        .into_iter()
        .map(|decoded| {
            let started = Instant::now();
            let image = compositor.composite(basemap, &decoded.raster);
            histogram!("radar_composite_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);
            RadarFrame::new(decoded.timestamp, decoded.url, image)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_guard_is_engine_wide() {
        let in_flight = Mutex::new(None);

        let guard = FlightGuard::acquire(&in_flight, "a".to_string()).unwrap();
        assert!(matches!(
            FlightGuard::acquire(&in_flight, "a".to_string()),
            Err(RadarError::AcquisitionInFlight(_))
        ));
        assert!(matches!(
            FlightGuard::acquire(&in_flight, "b".to_string()),
            Err(RadarError::AcquisitionInFlight(key)) if key == "b"
        ));

        drop(guard);
        assert!(FlightGuard::acquire(&in_flight, "b".to_string()).is_ok());
    }
}
