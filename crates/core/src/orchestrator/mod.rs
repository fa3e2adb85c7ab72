//! Report panel orchestration.
//!
//! A [`ReportOrchestrator`] drives one report panel through
//! `Idle -> Loading -> {Ready, Failed}` and, from `Ready`, the export side
//! transition `Exporting -> {Idle, Failed}`. Errors never escape as panics;
//! they are converted into a [`PanelError`] held by the panel.
//!
//! Concurrency rules:
//! - Each `generate` call bumps a generation counter and cancels the token of
//!   the request it replaces. A completion whose generation is no longer
//!   current is discarded as [`ReportError::Superseded`] and leaves the panel
//!   untouched.
//! - The fetch phase runs under a bounded wait and a cancellation token.
//! - A failed generate or export never drops the last good result.

pub mod error;
pub mod notifier;


use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::export::{
    ArchivedArtifact, Artifact, ExportError, ExportFormat, ExportStorage, PdfRenderer,
    PrintOptions, ReportExporter, default_file_name,
};
use crate::reports::{ReportAggregator, ReportError, ReportFilter, ReportKind, ReportRegistry, ReportResult};
use crate::store::DataStore;

pub use error::{PanelError, PanelErrorView, PanelStage};
pub use notifier::{ProgressNotifier, TracingNotifier};

/// Panel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    /// Nothing in flight.
    Idle,
    /// Fetching and aggregating.
    Loading,
    /// Holding a fresh result.
    Ready,
    /// Rendering or delivering an artifact.
    Exporting,
    /// The last operation failed.
    Failed,
}

impl PanelState {
    /// True while a fetch or an export is running.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Exporting)
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Exporting => "exporting",
            Self::Failed => "failed",
        })
    }
}

/// Where an exported artifact goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportDestination {
    /// Bytes handed back to the caller.
    #[default]
    Download,
    /// Written to archive storage.
    Archive {
        /// Optional folder in front of the generated key.
        key_prefix: Option<String>,
    },
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportReceipt {
    /// Artifact for the caller to deliver.
    Download(Artifact),
    /// Artifact stored in the archive.
    Archived {
        /// Artifact file name.
        file_name: String,
        /// Storage location.
        location: ArchivedArtifact,
    },
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Upper bound on the fetch phase.
    pub fetch_timeout: Duration,
    /// Print settings; `print.tz` is also the reporting timezone.
    pub print: PrintOptions,
}

#[derive(Debug)]
struct Panel {
    state: PanelState,
    generation: u64,
    in_flight: Option<CancellationToken>,
    result: Option<Arc<ReportResult>>,
    error: Option<PanelError>,
}

impl Panel {
    const fn new() -> Self {
        Self {
            state: PanelState::Idle,
            generation: 0,
            in_flight: None,
            result: None,
            error: None,
        }
    }

    fn can_export(&self) -> bool {
        match self.state {
            PanelState::Ready => true,
            PanelState::Failed => self
                .error
                .as_ref()
                .is_some_and(|e| e.stage() == PanelStage::Export),
            PanelState::Idle | PanelState::Loading | PanelState::Exporting => false,
        }
    }
}

/// Drives one report panel.
pub struct ReportOrchestrator {
    registry: Arc<ReportRegistry>,
    aggregator: ReportAggregator,
    exporter: ReportExporter,
    storage: Option<ExportStorage>,
    fetch_timeout: Duration,
    panel: Mutex<Panel>,
}

impl fmt::Debug for ReportOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportOrchestrator")
            .field("registry", &self.registry)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ReportOrchestrator {
    /// Creates an idle panel.
    #[must_use]
    pub fn new(
        registry: Arc<ReportRegistry>,
        store: Arc<dyn DataStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            aggregator: ReportAggregator::new(store, settings.print.tz),
            exporter: ReportExporter::new(settings.print),
            storage: None,
            fetch_timeout: settings.fetch_timeout,
            panel: Mutex::new(Panel::new()),
        }
    }

    /// Enables PDF export.
    #[must_use]
    pub fn with_pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.exporter = self.exporter.with_pdf_renderer(renderer);
        self
    }

    /// Enables archive exports.
    #[must_use]
    pub fn with_storage(mut self, storage: ExportStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Panel> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state.
    pub fn state(&self) -> PanelState {
        self.lock().state
    }

    /// Last successful result, kept across later failures.
    pub fn last_result(&self) -> Option<Arc<ReportResult>> {
        self.lock().result.clone()
    }

    /// Error from the last failed operation, if the panel is `Failed`.
    pub fn last_error(&self) -> Option<PanelError> {
        self.lock().error.clone()
    }

    /// Generates a report, replacing any request still in flight.
    ///
    /// # Errors
    ///
    /// Returns the aggregation error (also held by the panel), or
    /// `ReportError::Superseded` if a newer request started meanwhile.
    pub async fn generate(
        &self,
        kind: ReportKind,
        filter: &ReportFilter,
    ) -> Result<Arc<ReportResult>, PanelError> {
        let descriptor = self.registry.get(kind)?;

        let (generation, token) = {
            let mut panel = self.lock();
            if let Some(previous) = panel.in_flight.take() {
                previous.cancel();
            }
            panel.generation += 1;
            panel.state = PanelState::Loading;
            let token = CancellationToken::new();
            panel.in_flight = Some(token.clone());
            (panel.generation, token)
        };

        debug!(report = %kind, generation, "report requested");

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(ReportError::Cancelled),
            outcome = tokio::time::timeout(
                self.fetch_timeout,
                self.aggregator.aggregate(descriptor.as_ref(), filter),
            ) => outcome.unwrap_or(Err(ReportError::Timeout {
                after: self.fetch_timeout,
            })),
        };

        let mut panel = self.lock();
        if panel.generation != generation {
            debug!(report = %kind, generation, current = panel.generation, "stale report response discarded");
            return Err(ReportError::Superseded.into());
        }
        panel.in_flight = None;

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                panel.result = Some(Arc::clone(&result));
                panel.error = None;
                panel.state = PanelState::Ready;
                info!(report = %kind, run_id = %result.run_id, rows = result.rows.len(), "panel ready");
                Ok(result)
            }
            Err(ReportError::Cancelled) => {
                panel.state = PanelState::Idle;
                info!(report = %kind, "report generation cancelled");
                Err(ReportError::Cancelled.into())
            }
            Err(err) => {
                warn!(report = %kind, error = %err, "report generation failed");
                let err = PanelError::from(err);
                panel.error = Some(err.clone());
                panel.state = PanelState::Failed;
                Err(err)
            }
        }
    }

    /// Cancels the request in flight, if any. The panel returns to `Idle`
    /// and keeps any earlier result.
    pub fn cancel(&self) -> bool {
        let mut panel = self.lock();
        match panel.in_flight.take() {
            Some(token) => {
                token.cancel();
                panel.state = PanelState::Idle;
                info!(generation = panel.generation, "report request cancelled");
                true
            }
            None => false,
        }
    }

    /// Renders `result` and delivers it to `destination`.
    ///
    /// Allowed from `Ready`, or from `Failed` after a failed export so the
    /// caller can retry without re-fetching.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::InvalidState` when the panel cannot export, or
    /// the render/delivery error (also held by the panel).
    pub async fn export(
        &self,
        result: &ReportResult,
        format: ExportFormat,
        destination: &ExportDestination,
        notifier: &dyn ProgressNotifier,
    ) -> Result<ExportReceipt, PanelError> {
        let generation = {
            let mut panel = self.lock();
            if !panel.can_export() {
                return Err(ExportError::invalid_state(panel.state).into());
            }
            panel.state = PanelState::Exporting;
            panel.generation
        };

        let file_name = default_file_name(result, format);
        notifier.start_download(&file_name, result.kind);

        let outcome = self.deliver(result, format, destination).await;

        match &outcome {
            Ok(_) => notifier.complete_download(),
            Err(err) => notifier.set_error(&err.to_string()),
        }

        let mut panel = self.lock();
        let current = panel.generation == generation;
        match outcome {
            Ok(receipt) => {
                if current {
                    panel.state = PanelState::Idle;
                    panel.error = None;
                }
                info!(report = %result.kind, %format, "report exported");
                Ok(receipt)
            }
            Err(err) => {
                warn!(report = %result.kind, %format, error = %err, "report export failed");
                let err = PanelError::from(err);
                if current {
                    panel.state = PanelState::Failed;
                    panel.error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    async fn deliver(
        &self,
        result: &ReportResult,
        format: ExportFormat,
        destination: &ExportDestination,
    ) -> Result<ExportReceipt, ExportError> {
        let artifact = self.exporter.render(result, format, None).await?;
        match destination {
            ExportDestination::Download => Ok(ExportReceipt::Download(artifact)),
            ExportDestination::Archive { key_prefix } => {
                let storage = self.storage.as_ref().ok_or(ExportError::StorageUnavailable)?;
                let key = ExportStorage::archive_key(
                    key_prefix.as_deref(),
                    result.kind,
                    result.generated_at,
                    &artifact.file_name,
                );
                let location = storage.put(&key, &artifact).await?;
                Ok(ExportReceipt::Archived {
                    file_name: artifact.file_name,
                    location,
                })
            }
        }
    }
}
