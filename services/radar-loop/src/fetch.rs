//! Concurrent retrieval and decoding of the selected mosaics.
//!
//! Any single failure aborts the whole batch.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use image::RgbaImage;
use metrics::counter;
use radar_common::{timestamp_from_last_modified, RadarError, RadarResult};
use renderer::png::decode_png;
use tracing::{debug, instrument, warn};

use crate::archive::ArchiveClient;
use crate::listing::CandidateImage;

/// A mosaic ready for compositing.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub raster: RgbaImage,
}

/// Frame time for a mosaic: filename, then `Last-Modified`, then `now`.
pub fn resolve_timestamp(
    candidate: &CandidateImage,
    last_modified: Option<&str>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if let Some(ts) = candidate.timestamp {
        return ts;
    }
    if let Some(ts) = last_modified.and_then(timestamp_from_last_modified) {
        return ts;
    }

    warn!(url = %candidate.url, "No timestamp for radar image, using retrieval time");
    now
}

/// Download and decode one mosaic.
#[instrument(skip(client, candidate), fields(url = %candidate.url))]
pub async fn fetch_and_decode(client: &dyn ArchiveClient, candidate: &CandidateImage) -> RadarResult<DecodedImage> {
    let fetched = client
        .fetch_image(&candidate.url)
        .await
        .map_err(|e| RadarError::ImageRetrieval {
            url: candidate.url.clone(),
            message: e.to_string(),
        })?;

    let timestamp = resolve_timestamp(candidate, fetched.last_modified.as_deref(), Utc::now());

    let bytes = fetched.bytes;
    let raster = tokio::task::spawn_blocking(move || decode_png(&bytes))
        .await
        .map_err(|e| RadarError::Decode {
            url: candidate.url.clone(),
            message: format!("decode task failed: {}", e),
        })?
        .map_err(|e| RadarError::Decode {
            url: candidate.url.clone(),
            message: e.to_string(),
        })?;

    counter!("radar_images_fetched_total").increment(1);
    debug!(width = raster.width(), height = raster.height(), timestamp = %timestamp, "Decoded radar image");

    Ok(DecodedImage {
        url: candidate.url.clone(),
        timestamp,
        raster,
    })
}

/// Fetch and decode every candidate concurrently; fail on the first error.
pub async fn fetch_all(client: &dyn ArchiveClient, candidates: &[CandidateImage]) -> RadarResult<Vec<DecodedImage>> {
    try_join_all(candidates.iter().map(|candidate| fetch_and_decode(client, candidate))).await
}
