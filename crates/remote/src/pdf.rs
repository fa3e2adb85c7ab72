//! PDF generation service client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use kabati_core::export::{ExportError, PdfPayload, PdfRenderer};
use kabati_shared::config::PdfConfig;
use reqwest::Client;
use tracing::{debug, instrument};

/// Posts report payloads to an HTTP PDF service and returns the document.
#[derive(Debug, Clone)]
pub struct HttpPdfRenderer {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPdfRenderer {
    /// Creates a renderer posting to `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Renderer for the `pdf` config section, or `None` when no endpoint is set.
    #[must_use]
    pub fn from_config(config: &PdfConfig) -> Option<Self> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, config.timeout()))
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    #[instrument(skip(self, payload), fields(title = %payload.title), err)]
    async fn render(&self, payload: &PdfPayload) -> Result<Bytes, ExportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/pdf")
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ExportError::pdf(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(ExportError::pdf(format!("service returned {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::pdf(e.to_string()))?;
        debug!(bytes = bytes.len(), "PDF received");
        Ok(bytes)
    }
}
