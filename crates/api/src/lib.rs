//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Report catalogue and generation routes
//! - Download and archive exports
//! - Per-panel cancellation
//! - JSON error responses

pub mod error;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use dashmap::DashMap;
use kabati_core::export::{ExportStorage, PdfRenderer};
use kabati_core::orchestrator::{OrchestratorSettings, ReportOrchestrator};
use kabati_core::period::PeriodResolver;
use kabati_core::reports::ReportRegistry;
use kabati_core::store::DataStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use error::ApiError;

/// Named panels kept before idle ones are evicted.
pub const DEFAULT_PANEL_LIMIT: usize = 256;

/// Collaborators every panel is built from.
#[derive(Clone)]
pub struct ReportServices {
    /// Report descriptors.
    pub registry: Arc<ReportRegistry>,
    /// Hosted data store.
    pub store: Arc<dyn DataStore>,
    /// Preset resolver.
    pub resolver: PeriodResolver,
    /// Timeout and print settings.
    pub settings: OrchestratorSettings,
    /// PDF service (optional).
    pub pdf: Option<Arc<dyn PdfRenderer>>,
    /// Archive storage (optional).
    pub storage: Option<ExportStorage>,
}

impl ReportServices {
    /// Services over the standard report catalogue.
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        resolver: PeriodResolver,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry: Arc::new(ReportRegistry::standard()),
            store,
            resolver,
            settings,
            pdf: None,
            storage: None,
        }
    }

    /// Enables PDF export.
    #[must_use]
    pub fn with_pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.pdf = Some(renderer);
        self
    }

    /// Enables archive exports.
    #[must_use]
    pub fn with_storage(mut self, storage: ExportStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// A fresh idle panel.
    #[must_use]
    pub fn orchestrator(&self) -> ReportOrchestrator {
        let mut orchestrator = ReportOrchestrator::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            self.settings.clone(),
        );
        if let Some(pdf) = &self.pdf {
            orchestrator = orchestrator.with_pdf_renderer(Arc::clone(pdf));
        }
        if let Some(storage) = &self.storage {
            orchestrator = orchestrator.with_storage(storage.clone());
        }
        orchestrator
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Report collaborators.
    pub services: Arc<ReportServices>,
    /// Named panels, so a newer request supersedes an older one.
    pub panels: Arc<DashMap<String, Arc<ReportOrchestrator>>>,
    panel_limit: usize,
}

impl AppState {
    /// Creates state with no panels.
    #[must_use]
    pub fn new(services: ReportServices) -> Self {
        Self {
            services: Arc::new(services),
            panels: Arc::new(DashMap::new()),
            panel_limit: DEFAULT_PANEL_LIMIT,
        }
    }

    /// Caps the number of named panels kept between requests.
    #[must_use]
    pub fn with_panel_limit(mut self, limit: usize) -> Self {
        self.panel_limit = limit.max(1);
        self
    }

    /// The named panel (created on first use), or a throwaway one.
    #[must_use]
    pub fn panel(&self, name: Option<&str>) -> Arc<ReportOrchestrator> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                if !self.panels.contains_key(name) && self.panels.len() >= self.panel_limit {
                    self.evict_idle_panels();
                }
                Arc::clone(
                    self.panels
                        .entry(name.to_owned())
                        .or_insert_with(|| Arc::new(self.services.orchestrator()))
                        .value(),
                )
            }
            None => Arc::new(self.services.orchestrator()),
        }
    }

    /// An existing named panel.
    #[must_use]
    pub fn existing_panel(&self, name: &str) -> Option<Arc<ReportOrchestrator>> {
        self.panels.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Forgets a named panel, returning it if it existed.
    pub fn remove_panel(&self, name: &str) -> Option<Arc<ReportOrchestrator>> {
        self.panels.remove(name).map(|(_, panel)| panel)
    }

    /// Drops every panel with nothing in flight. Busy panels stay, so the
    /// limit can be exceeded while that many requests are running.
    fn evict_idle_panels(&self) {
        let before = self.panels.len();
        self.panels.retain(|_, panel| panel.state().is_busy());
        debug!(evicted = before - self.panels.len(), "idle panels evicted");
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
