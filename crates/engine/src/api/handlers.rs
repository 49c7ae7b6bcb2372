use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::ApiState;
use crate::metrics::exposition::{render_prometheus, write_gauge};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub tracked_messages: usize,
}

/// Lifetime correlation counters next to what the tracker holds right now.
#[derive(Serialize)]
pub struct CorrelationsResponse {
    pub tracked: usize,
    pub opened: u64,
    pub closed: u64,
    pub expired: u64,
}

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn ready(State(s): State<ApiState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        tracked_messages: s.tracker.open_count(),
    })
}

pub async fn correlations(State(s): State<ApiState>) -> Json<CorrelationsResponse> {
    Json(CorrelationsResponse {
        tracked: s.tracker.open_count(),
        opened: s.metrics.correlations_opened_val(),
        closed: s.metrics.correlations_closed_val(),
        expired: s.metrics.correlations_expired_val(),
    })
}

pub async fn metrics(State(s): State<ApiState>) -> impl IntoResponse {
    let mut body = render_prometheus(&s.metrics);
    write_gauge(
        &mut body,
        "sentinel_engine_correlations_tracked",
        s.tracker.open_count() as u64,
    );
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
