//! HTTP surface for hosts displaying the radar loop.
//!
//! Provides endpoints for:
//! - Playback status and the last acquisition cycle
//! - Frame metadata and composited PNGs
//! - The frame for the current tick
//! - Out-of-band re-acquisition
//! - Prometheus metrics

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use metrics_exporter_prometheus::PrometheusHandle;
use radar_common::{GeoPosition, RadarError};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::engine::{CycleReport, RadarEngine};
use crate::frame::FrameSummary;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub status: String,
    pub region: String,
    pub current_screen_index: usize,
    pub total_frames: usize,
    pub tick_delay_ms: u64,
    pub frame_times: Vec<String>,
    pub last_cycle: Option<CycleReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub engine: Arc<RadarEngine>,
    pub position: GeoPosition,
    pub prometheus: Option<PrometheusHandle>,
}

// ============================================================================
// Router
// ============================================================================

/// Create the radar API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/frames", get(frames_handler))
        .route("/frames/:index", get(frame_png_handler))
        .route("/current", get(current_handler))
        .route("/current.png", get(current_png_handler))
        .route("/refresh", post(refresh_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(Extension(state))
}

/// Run the HTTP server until the process exits.
pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    info!(addr = %addr, "Starting radar HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /status - Playback state and the last cycle
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let (playback, frames, tick_delay) = {
        let scheduler = state.engine.playback().read().await;
        (scheduler.state(), scheduler.frames(), scheduler.tick_delay())
    };

    Json(StatusResponse {
        service: "radar-loop".to_string(),
        status: playback.status.to_string(),
        region: state.position.region_code.clone(),
        current_screen_index: playback.current_screen_index,
        total_frames: playback.total_frames,
        tick_delay_ms: tick_delay.as_millis() as u64,
        frame_times: frames.iter().map(|f| f.time_label().trim().to_string()).collect(),
        last_cycle: state.engine.last_cycle().await,
    })
}

/// GET /frames - Metadata for every published frame
async fn frames_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let frames = state.engine.playback().read().await.frames();
    let summaries: Vec<FrameSummary> = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| frame.summary(index))
        .collect();

    Json(summaries)
}

/// GET /frames/:index - Composited PNG for one frame
async fn frame_png_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Path(index): Path<usize>,
) -> Response {
    let frames = state.engine.playback().read().await.frames();
    match frames.get(index) {
        Some(frame) => png_response(frame.png.clone()),
        None => not_found(format!("No frame at index {}", index)),
    }
}

/// GET /current - Frame shown at the current tick
async fn current_handler(Extension(state): Extension<Arc<ServerState>>) -> Response {
    match state.engine.playback().read().await.render() {
        Some(view) => Json(view).into_response(),
        None => not_found("No frame is playing".to_string()),
    }
}

/// GET /current.png
async fn current_png_handler(Extension(state): Extension<Arc<ServerState>>) -> Response {
    match state.engine.playback().read().await.render() {
        Some(view) => png_response(view.png),
        None => not_found("No frame is playing".to_string()),
    }
}

/// POST /refresh - Run an acquisition cycle now
async fn refresh_handler(Extension(state): Extension<Arc<ServerState>>) -> Response {
    match state.engine.acquire(&state.position).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /metrics - Prometheus text format
async fn metrics_handler(Extension(state): Extension<Arc<ServerState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::OK, "# metrics\n").into_response(),
    }
}

fn png_response(png: Bytes) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response()
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message })).into_response()
}

fn error_response(err: &RadarError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse { error: err.to_string() })).into_response()
}
