//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether PDF export is configured.
    pub pdf_export: bool,
    /// Archive storage provider, if configured.
    pub archive: Option<&'static str>,
    /// Number of named panels alive.
    pub panels: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        pdf_export: state.services.pdf.is_some(),
        archive: state.services.storage.as_ref().map(|s| s.provider_name()),
        panels: state.panels.len(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
