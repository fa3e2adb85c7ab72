//! Report routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use kabati_core::export::{Artifact, ExportFormat};
use kabati_core::orchestrator::{ExportDestination, ExportReceipt, TracingNotifier};
use kabati_core::period::PresetKey;
use kabati_core::reports::{CatalogueEntry, ReportFilter, ReportKind};
use kabati_shared::AppError;
use kabati_shared::types::ClientId;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, AppState, ReportServices};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/{kind}", get(generate_report))
        .route("/reports/{kind}/archive", post(archive_report))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters shared by generate and archive.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Date preset (defaults to `month`, or `custom` when bounds are given).
    pub preset: Option<String>,
    /// Custom range start (inclusive).
    pub from: Option<NaiveDate>,
    /// Custom range end (inclusive, whole day).
    pub to: Option<NaiveDate>,
    /// Limit to one client.
    pub client_id: Option<String>,
    /// Report sub-type.
    pub sub_type: Option<String>,
    /// Comma-separated include flags.
    pub include: Option<String>,
    /// `csv`, `html`, `pdf` or `json` (default).
    pub format: Option<String>,
    /// Named panel; a newer request on the same panel supersedes older ones.
    pub panel: Option<String>,
    /// Explicit download file name.
    pub file_name: Option<String>,
    /// Folder in front of the archive key.
    pub key_prefix: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for the catalogue.
#[derive(Debug, Serialize)]
pub struct CatalogueResponse {
    /// Registered reports.
    pub reports: Vec<CatalogueEntry>,
    /// Accepted presets.
    pub presets: Vec<&'static str>,
    /// Accepted formats.
    pub formats: Vec<ExportFormat>,
}

/// Response for an archived export.
#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    /// Storage key.
    pub location: String,
    /// Artifact file name.
    pub file_name: String,
    /// Bytes written.
    pub size: u64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_reports(State(state): State<AppState>) -> Json<CatalogueResponse> {
    let mut formats = vec![ExportFormat::Csv, ExportFormat::Html, ExportFormat::Json];
    if state.services.pdf.is_some() {
        formats.push(ExportFormat::Pdf);
    }
    Json(CatalogueResponse {
        reports: state.services.registry.catalogue(),
        presets: PresetKey::ALL.iter().map(|p| p.as_str()).collect(),
        formats,
    })
}

async fn generate_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let format = parse_format(query.format.as_deref())?;
    let filter = build_filter(&state.services, &query, Utc::now())?;

    let panel = state.panel(query.panel.as_deref());
    let result = panel.generate(kind, &filter).await?;
    let receipt = panel
        .export(&result, format, &ExportDestination::Download, &TracingNotifier)
        .await?;

    let ExportReceipt::Download(mut artifact) = receipt else {
        return Err(AppError::Internal("download produced an archive receipt".into()).into());
    };
    if let Some(name) = query.file_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        artifact.file_name = name.replace(['"', '\\', '\r', '\n'], "_");
    }

    info!(report = %kind, %format, bytes = artifact.bytes.len(), "report downloaded");
    Ok(download_response(artifact, format))
}

async fn archive_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<(StatusCode, Json<ArchiveResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let format = parse_format(query.format.as_deref())?;
    let filter = build_filter(&state.services, &query, Utc::now())?;

    let panel = state.panel(query.panel.as_deref());
    let result = panel.generate(kind, &filter).await?;
    let destination = ExportDestination::Archive {
        key_prefix: query.key_prefix.clone(),
    };
    let receipt = panel
        .export(&result, format, &destination, &TracingNotifier)
        .await?;

    let ExportReceipt::Archived { file_name, location } = receipt else {
        return Err(AppError::Internal("archive produced a download receipt".into()).into());
    };

    info!(report = %kind, key = %location.key, "report archived");
    Ok((
        StatusCode::CREATED,
        Json(ArchiveResponse {
            location: location.key,
            file_name,
            size: location.size,
        }),
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_kind(name: &str) -> Result<ReportKind, ApiError> {
    name.parse()
        .map_err(|_| AppError::NotFound(format!("Unknown report type: {name}")).into())
}

fn parse_format(format: Option<&str>) -> Result<ExportFormat, ApiError> {
    format.map_or(Ok(ExportFormat::Json), |f| {
        f.parse().map_err(|e: String| AppError::Validation(e).into())
    })
}

/// Resolves the period and collects the report options.
fn build_filter(
    services: &ReportServices,
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> Result<ReportFilter, ApiError> {
    let preset = match query.preset.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(preset) => preset.parse::<PresetKey>()?,
        None if query.from.is_some() || query.to.is_some() => PresetKey::Custom,
        None => PresetKey::Month,
    };
    let range = services.resolver.resolve(preset, query.from, query.to, now)?;

    let mut filter = ReportFilter::new(range);
    if let Some(client) = query.client_id.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let client: ClientId = client
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid client_id: {e}")))?;
        filter = filter.for_client(client);
    }
    if let Some(sub_type) = query.sub_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter = filter.with_sub_type(sub_type);
    }
    for flag in query
        .include
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        filter = filter.include(flag.to_lowercase());
    }
    Ok(filter)
}

fn download_response(artifact: Artifact, format: ExportFormat) -> Response {
    let disposition = if format == ExportFormat::Json {
        "inline".to_owned()
    } else {
        format!("attachment; filename=\"{}\"", artifact.file_name)
    };
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
