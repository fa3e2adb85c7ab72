//! Progress notifications around an export.

use tracing::{info, warn};

use crate::reports::ReportKind;

/// Receives the three calls made around every export.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressNotifier: Send + Sync {
    /// An artifact named `name` is being produced.
    fn start_download(&self, name: &str, kind: ReportKind);

    /// The artifact was delivered.
    fn complete_download(&self);

    /// The export failed.
    fn set_error(&self, message: &str);
}

/// Logs progress instead of driving a UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ProgressNotifier for TracingNotifier {
    fn start_download(&self, name: &str, kind: ReportKind) {
        info!(file = name, report = %kind, "export started");
    }

    fn complete_download(&self) {
        info!("export completed");
    }

    fn set_error(&self, message: &str) {
        warn!(error = message, "export failed");
    }
}
