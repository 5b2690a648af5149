//! Weather radar loop service.
//!
//! Builds an animated radar loop for one location:
//! - Discovers recent reflectivity mosaics in the archive
//! - Composites them onto the regional basemap
//! - Plays them back on a variable-cadence timetable
//! - Re-acquires on a fixed interval
//! - Serves frames and status over HTTP

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use radar_common::RadarStatus;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_loop::playback::SharedPlayback;
use radar_loop::server::{self, ServerState};
use radar_loop::{HttpArchive, PlaybackScheduler, RadarConfig, RadarEngine};

#[derive(Parser, Debug)]
#[command(name = "radar-loop")]
#[command(about = "Animated weather radar loop")]
struct Args {
    /// Configuration file
    #[arg(long, env = "RADAR_CONFIG", default_value = "config/radar.yaml")]
    config: PathBuf,

    /// Run a single acquisition cycle and exit
    #[arg(long)]
    once: bool,

    /// Port for the HTTP server
    #[arg(long, env = "STATUS_PORT", default_value = "8082")]
    port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Disable the HTTP server
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = RadarConfig::load(&args.config)?;
    info!(
        config = %args.config.display(),
        region = %config.location.region_code,
        latitude = config.location.latitude,
        longitude = config.location.longitude,
        "Starting radar loop"
    );

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let archive = HttpArchive::new(&config.archive)?;
    let playback = PlaybackScheduler::new(&config.playback)
        .with_listener(Arc::new(|status: RadarStatus| info!(status = %status, "Radar status")))
        .shared();
    let engine = Arc::new(RadarEngine::new(&config, Arc::new(archive), playback.clone()));

    if args.once {
        info!("Running single acquisition cycle");
        let report = engine.acquire(&config.location).await?;
        info!(status = %report.status, frames = report.frames, "Acquisition finished");
        return Ok(());
    }

    if !args.no_server {
        let state = Arc::new(ServerState {
            engine: engine.clone(),
            position: config.location.clone(),
            prometheus: Some(prometheus),
        });
        let port = args.port;
        tokio::spawn(async move {
            if let Err(e) = server::run_server(state, port).await {
                error!(error = %e, "HTTP server failed");
            }
        });
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx_clone.send(()).ok();
    });

    tokio::spawn(run_ticker(playback, shutdown_tx.subscribe()));

    let mut shutdown = shutdown_tx.subscribe();
    loop {
        if let Err(e) = engine.acquire(&config.location).await {
            error!(error = %e, "Scheduled acquisition failed");
        }

        tokio::select! {
            _ = shutdown.recv() => {
                info!("Shutting down radar loop");
                break;
            }
            _ = tokio::time::sleep(config.refresh_interval()) => {}
        }
    }

    Ok(())
}

/// Advance playback once per tick until shutdown.
async fn run_ticker(playback: SharedPlayback, mut shutdown: broadcast::Receiver<()>) {
    loop {
        let delay = playback.read().await.tick_delay();

        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(delay) => {
                playback.write().await.advance();
            }
        }
    }
}
