//! Discovery of candidate mosaics from the archive's daily directory indexes.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use once_cell::sync::Lazy;
use radar_common::{listing_days, listing_path, timestamp_from_filename, RadarError};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::ArchiveClient;
use crate::config::ArchiveConfig;

/// Anchor `href` and visible text. Only anchors are needed from the index.
static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#).expect("valid regex")
});

/// A mosaic found in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateImage {
    pub url: String,
    /// Parsed from the filename; filled in at decode time when absent
    pub timestamp: Option<DateTime<Utc>>,
}

impl CandidateImage {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let timestamp = timestamp_from_filename(&url);
        Self { url, timestamp }
    }
}

/// Listing URLs for yesterday and today, oldest first.
pub fn listing_urls(config: &ArchiveConfig, now: DateTime<Utc>) -> Vec<String> {
    listing_days(now)
        .into_iter()
        .map(|day| format!("{}{}{}", config.base_url, listing_path(day), config.path_suffix))
        .collect()
}

/// Pull candidate mosaics out of one directory index.
///
/// An anchor qualifies when its visible text contains both `marker` and
/// `.png`. Relative hrefs are resolved against `listing_url`.
pub fn extract_candidates(html: &str, listing_url: &str, marker: &str) -> Result<Vec<CandidateImage>, RadarError> {
    let base = Url::parse(listing_url).map_err(|e| RadarError::ListingRetrieval {
        url: listing_url.to_string(),
        message: format!("invalid listing URL: {}", e),
    })?;

    let mut candidates = Vec::new();
    for caps in ANCHOR.captures_iter(html) {
        let (href, text) = (&caps[1], &caps[2]);
        if !(text.contains(marker) && text.contains(".png")) {
            continue;
        }

        match base.join(href.trim()) {
            Ok(url) => candidates.push(CandidateImage::new(url.to_string())),
            Err(e) => debug!(href = %href, error = %e, "Skipping unresolvable anchor"),
        }
    }

    Ok(candidates)
}

/// Result of reading every listing for one cycle.
#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub candidates: Vec<CandidateImage>,
    /// One entry per listing that could not be read
    pub failures: Vec<RadarError>,
}

impl ListingOutcome {
    pub fn degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Fetch all listings concurrently, keeping whatever succeeds.
pub async fn resolve_candidates(client: &dyn ArchiveClient, urls: &[String], marker: &str) -> ListingOutcome {
    let results = join_all(urls.iter().map(|url| async move {
        let html = client
            .fetch_text(url)
            .await
            .map_err(|e| RadarError::ListingRetrieval {
                url: url.clone(),
                message: e.to_string(),
            })?;
        extract_candidates(&html, url, marker)
    }))
    .await;

    let mut outcome = ListingOutcome::default();
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(found) => {
                debug!(url = %url, count = found.len(), "Read listing");
                outcome.candidates.extend(found);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Unable to get list of radars");
                counter!("radar_listing_failures_total").increment(1);
                outcome.failures.push(e);
            }
        }
    }

    info!(
        listings = urls.len(),
        failed = outcome.failures.len(),
        candidates = outcome.candidates.len(),
        "Resolved radar candidates"
    );
    outcome
}

/// Keep the `max` most recent candidates, oldest first.
///
/// Candidates without a filename timestamp sort before all others. Repeated
/// URLs are kept once.
pub fn select_recent(mut candidates: Vec<CandidateImage>, max: usize) -> Vec<CandidateImage> {
    candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.url.cmp(&b.url)));
    candidates.dedup_by(|a, b| a.url == b.url);

    let skip = candidates.len().saturating_sub(max);
    candidates.into_iter().skip(skip).collect()
}
