//! Panel inspection and cancellation.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use kabati_core::orchestrator::{PanelErrorView, PanelState};
use kabati_core::reports::ReportKind;
use kabati_shared::AppError;
use kabati_shared::types::ReportRunId;
use serde::Serialize;

use crate::{ApiError, AppState};

/// Creates the panel routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/panels/{panel}", get(get_panel).delete(cancel_panel))
}

/// Snapshot of a named panel.
#[derive(Debug, Serialize)]
pub struct PanelResponse {
    /// Panel name.
    pub panel: String,
    /// Lifecycle state.
    pub state: PanelState,
    /// Kind of the last good result.
    pub last_kind: Option<ReportKind>,
    /// Run id of the last good result.
    pub last_run_id: Option<ReportRunId>,
    /// Error held after a failure.
    pub error: Option<PanelErrorView>,
}

/// Outcome of a cancel request.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Panel name.
    pub panel: String,
    /// True if a request was in flight.
    pub cancelled: bool,
    /// The panel is forgotten; its last result is gone.
    pub removed: bool,
}

fn not_found(panel: &str) -> ApiError {
    AppError::NotFound(format!("Panel not found: {panel}")).into()
}

async fn get_panel(
    State(state): State<AppState>,
    Path(panel): Path<String>,
) -> Result<Json<PanelResponse>, ApiError> {
    let orchestrator = state.existing_panel(&panel).ok_or_else(|| not_found(&panel))?;
    let last = orchestrator.last_result();
    Ok(Json(PanelResponse {
        state: orchestrator.state(),
        last_kind: last.as_ref().map(|r| r.kind),
        last_run_id: last.as_ref().map(|r| r.run_id),
        error: orchestrator.last_error().map(|e| e.describe()),
        panel,
    }))
}

async fn cancel_panel(
    State(state): State<AppState>,
    Path(panel): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let orchestrator = state.remove_panel(&panel).ok_or_else(|| not_found(&panel))?;
    let cancelled = orchestrator.cancel();
    Ok(Json(CancelResponse {
        panel,
        cancelled,
        removed: true,
    }))
}
