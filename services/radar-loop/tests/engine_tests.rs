//! Tests for the acquisition cycle against an in-memory archive.

mod common;

use std::sync::Arc;
use std::time::Duration;

use radar_common::{GeoPosition, RadarError, RadarStatus};
use test_utils::listing::{directory_index, mosaic_names, TODAY_URL, YESTERDAY_URL};
use test_utils::positions::{anchorage, honolulu};
use test_utils::time::{reference_now, LAST_MODIFIED};
use tokio_test::{assert_err, assert_ok};

use common::{build_engine, count, northwest, test_config, write_basemap, FakeArchive};

fn today_archive(names: &[String]) -> FakeArchive {
    FakeArchive::new()
        .with_listing(YESTERDAY_URL, directory_index(&[]))
        .with_listing(TODAY_URL, directory_index(names))
        .with_mosaics(TODAY_URL, names)
}

// ============================================================================
// Region guard
// ============================================================================

#[tokio::test]
async fn test_excluded_region_is_no_data_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let archive = Arc::new(FakeArchive::new());
    let (engine, log) = build_engine(&config, archive.clone());

    for pos in [anchorage(), honolulu()] {
        let report = engine.acquire_at(&pos, reference_now()).await.unwrap();
        assert_eq!(report.status, RadarStatus::NoData);
        assert_eq!(report.frames, 0);
    }

    assert_eq!(archive.calls(), 0);
    assert_eq!(count(&log, RadarStatus::NoData), 2);
    assert_eq!(engine.playback().read().await.status(), RadarStatus::NoData);
}

#[tokio::test]
async fn test_hawaii_uses_hawaii_basemap_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(write_basemap(dir.path()));
    config.regions.excluded = vec!["AK".to_string()];
    let archive = Arc::new(FakeArchive::new());
    let (engine, _log) = build_engine(&config, archive.clone());

    // Only the continental basemap exists on disk
    let err = engine.acquire_at(&honolulu(), reference_now()).await.unwrap_err();
    match err {
        RadarError::Basemap { path, .. } => assert!(path.ends_with("hawaii.png")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(archive.calls(), 0);
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_yesterday_listing_failure_keeps_today() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 3);
    let archive = Arc::new(
        FakeArchive::new()
            .with_listing_status(YESTERDAY_URL, 503)
            .with_listing(TODAY_URL, directory_index(&names))
            .with_mosaics(TODAY_URL, &names),
    );
    let (engine, log) = build_engine(&config, archive.clone());

    let report = engine.acquire_at(&northwest(), reference_now()).await.unwrap();

    assert_eq!(report.status, RadarStatus::Failed);
    assert_eq!(report.listing_failures, 1);
    assert_eq!(report.frames, 3);
    assert_eq!(count(&log, RadarStatus::Failed), 1);
    assert_eq!(count(&log, RadarStatus::Loaded), 0);
    assert_eq!(archive.calls(), 2 + 3);

    let mut playback = engine.playback().write().await;
    let frames = playback.frames();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|f| f.source_url.starts_with(TODAY_URL)));

    // Listed for inspection only; a failed cycle never plays
    assert_eq!(playback.advance(), None);
    assert!(playback.render().is_none());
}

#[tokio::test]
async fn test_no_candidates_loads_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let (engine, log) = build_engine(&config, Arc::new(today_archive(&[])));

    let report = engine.acquire_at(&northwest(), reference_now()).await.unwrap();
    assert_eq!(report.status, RadarStatus::Loaded);
    assert_eq!(report.frames, 0);
    assert_eq!(count(&log, RadarStatus::Loaded), 1);

    let mut playback = engine.playback().write().await;
    assert_eq!(playback.advance(), None);
    assert!(playback.render().is_none());
}

// ============================================================================
// Fetch and decode
// ============================================================================

#[tokio::test]
async fn test_frames_capped_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let yesterday = mosaic_names("20240114", 22, 6);
    let today = mosaic_names("20240115", 12, 6);
    let archive = Arc::new(
        FakeArchive::new()
            .with_listing(YESTERDAY_URL, directory_index(&yesterday))
            .with_listing(TODAY_URL, directory_index(&today))
            .with_mosaics(YESTERDAY_URL, &yesterday)
            .with_mosaics(TODAY_URL, &today),
    );
    let (engine, _log) = build_engine(&config, archive.clone());

    let report = engine.acquire_at(&northwest(), reference_now()).await.unwrap();
    assert_eq!(report.status, RadarStatus::Loaded);
    assert_eq!(report.candidates, 12);
    assert_eq!(report.frames, 6);
    assert_eq!(archive.calls(), 2 + 6);

    let frames = engine.playback().read().await.frames();
    assert!(frames.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(frames.iter().all(|f| f.source_url.starts_with(TODAY_URL)));
    assert!(frames[5].source_url.ends_with("n0r_202401151225.png"));
}

#[tokio::test]
async fn test_completion_order_does_not_affect_frame_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 4);
    let mut archive = today_archive(&names);
    // Oldest finishes last
    for (i, name) in names.iter().enumerate() {
        let delay = Duration::from_millis(20 * (names.len() - i) as u64);
        archive = archive.with_delay(&format!("{}{}", TODAY_URL, name), delay);
    }
    let (engine, _log) = build_engine(&config, Arc::new(archive));

    engine.acquire_at(&northwest(), reference_now()).await.unwrap();

    let frames = engine.playback().read().await.frames();
    let urls: Vec<_> = frames.iter().map(|f| f.source_url.clone()).collect();
    let expected: Vec<_> = names.iter().map(|n| format!("{}{}", TODAY_URL, n)).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn test_single_image_failure_aborts_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 3);
    let archive = today_archive(&names).with_image_status(&format!("{}{}", TODAY_URL, names[1]), 503);
    let (engine, log) = build_engine(&config, Arc::new(archive));

    let err = engine.acquire_at(&northwest(), reference_now()).await.unwrap_err();
    assert!(matches!(err, RadarError::ImageRetrieval { .. }));

    let playback = engine.playback().read().await;
    assert_eq!(playback.status(), RadarStatus::Failed);
    assert!(playback.frames().is_empty());
    assert_eq!(count(&log, RadarStatus::Failed), 1);
}

#[tokio::test]
async fn test_decode_failure_aborts_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 2);
    let archive = today_archive(&names).with_image(
        &format!("{}{}", TODAY_URL, names[0]),
        b"<html>Service Unavailable</html>".to_vec(),
        None,
    );
    let (engine, _log) = build_engine(&config, Arc::new(archive));

    let err = engine.acquire_at(&northwest(), reference_now()).await.unwrap_err();
    assert!(matches!(err, RadarError::Decode { .. }));
    assert_eq!(engine.last_cycle().await.unwrap().status, RadarStatus::Failed);
}

#[tokio::test]
async fn test_last_modified_timestamp_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let html = r#"<pre><a href="latest.png">n0r_latest.png</a></pre>"#.to_string();
    let archive = FakeArchive::new()
        .with_listing(YESTERDAY_URL, directory_index(&[]))
        .with_listing(TODAY_URL, html)
        .with_image(&format!("{}latest.png", TODAY_URL), common::mosaic_png(), Some(LAST_MODIFIED));
    let (engine, _log) = build_engine(&config, Arc::new(archive));

    engine.acquire_at(&northwest(), reference_now()).await.unwrap();

    let frames = engine.playback().read().await.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].timestamp.to_rfc3339(), "2024-01-15T12:40:00+00:00");
}

// ============================================================================
// Compositing and publishing
// ============================================================================

#[tokio::test]
async fn test_frames_are_composited() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 2);
    let (engine, _log) = build_engine(&config, Arc::new(today_archive(&names)));

    engine.acquire_at(&northwest(), reference_now()).await.unwrap();

    let frames = engine.playback().read().await.frames();
    for frame in frames.iter() {
        assert_eq!(frame.image.dimensions(), (640, 367));
        assert_eq!(frame.image.get_pixel(100, 100).0, [49, 210, 22, 255]);
        assert!(frame.png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

#[tokio::test]
async fn test_basemap_loaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let basemaps = write_basemap(dir.path());
    let config = test_config(basemaps.clone());
    let names = mosaic_names("20240115", 12, 2);
    let (engine, log) = build_engine(&config, Arc::new(today_archive(&names)));

    engine.acquire_at(&northwest(), reference_now()).await.unwrap();
    std::fs::remove_file(&basemaps.continental).unwrap();

    let report = engine.acquire_at(&northwest(), reference_now()).await.unwrap();
    assert_eq!(report.status, RadarStatus::Loaded);
    assert_eq!(count(&log, RadarStatus::Loaded), 2);
    assert_eq!(count(&log, RadarStatus::Loading), 1);
}

#[tokio::test]
async fn test_concurrent_acquisition_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 2);
    let archive = today_archive(&names).with_delay(TODAY_URL, Duration::from_millis(100));
    let (engine, _log) = build_engine(&config, Arc::new(archive));

    let pos = northwest();
    let (first, second) = tokio::join!(
        engine.acquire_at(&pos, reference_now()),
        engine.acquire_at(&pos, reference_now()),
    );

    assert_ok!(first);
    let err = assert_err!(second);
    assert!(matches!(err, RadarError::AcquisitionInFlight(_)));
    assert_ok!(engine.acquire_at(&pos, reference_now()).await);
}

#[tokio::test]
async fn test_loaded_cycle_starts_on_newest_frame() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 6);
    let (engine, _log) = build_engine(&config, Arc::new(today_archive(&names)));

    engine.acquire_at(&northwest(), reference_now()).await.unwrap();

    let playback = engine.playback().read().await;
    let view = playback.render().unwrap();
    assert_eq!(view.index, 5);
    assert_eq!(view.scroll_offset, -5 * 371);
    assert_eq!(view.time_label.len(), 8);
}

#[tokio::test]
async fn test_concurrent_cycles_for_different_positions_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(write_basemap(dir.path()));
    let names = mosaic_names("20240115", 12, 3);
    let archive = today_archive(&names).with_delay(TODAY_URL, Duration::from_millis(150));
    let (engine, log) = build_engine(&config, Arc::new(archive));

    let nearby = GeoPosition::new(50.9, -129.4, "WA");
    let origin = northwest();
    let (first, second) = tokio::join!(
        engine.acquire_at(&origin, reference_now()),
        engine.acquire_at(&nearby, reference_now()),
    );

    let report = assert_ok!(first);
    assert_eq!(report.status, RadarStatus::Loaded);
    assert_eq!(report.frames, 3);
    let err = assert_err!(second);
    assert!(matches!(err, RadarError::AcquisitionInFlight(_)));

    {
        let playback = engine.playback().read().await;
        assert_eq!(playback.status(), RadarStatus::Loaded);
        assert_eq!(playback.frames().len(), 3);
    }
    assert_eq!(count(&log, RadarStatus::Failed), 0);

    let report = assert_ok!(engine.acquire_at(&nearby, reference_now()).await);
    assert_eq!(report.status, RadarStatus::Loaded);
}
