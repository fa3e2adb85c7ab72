//! Archive storage for exported reports, using Apache OpenDAL.

use chrono::{DateTime, Datelike, Utc};
use kabati_shared::config::StorageConfig;
use opendal::{Operator, services};

use super::Artifact;
use super::error::ExportError;
use crate::reports::ReportKind;

/// Where an archived artifact was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedArtifact {
    /// Storage key.
    pub key: String,
    /// Bytes written.
    pub size: u64,
}

/// Writes report artifacts to object storage.
#[derive(Debug, Clone)]
pub struct ExportStorage {
    operator: Operator,
    provider: &'static str,
}

impl ExportStorage {
    /// Creates a storage backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, ExportError> {
        let (operator, provider) = match config {
            StorageConfig::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                let operator = Operator::new(builder)
                    .map_err(|e| ExportError::storage_configuration(e.to_string()))?
                    .finish();
                (operator, "s3")
            }
            StorageConfig::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| ExportError::storage_configuration("invalid path"))?;
                let operator = Operator::new(services::Fs::default().root(root))
                    .map_err(|e| ExportError::storage_configuration(e.to_string()))?
                    .finish();
                (operator, "local")
            }
        };
        Ok(Self { operator, provider })
    }

    /// In-process storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn in_memory() -> Result<Self, ExportError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| ExportError::storage_configuration(e.to_string()))?
            .finish();
        Ok(Self {
            operator,
            provider: "memory",
        })
    }

    /// Provider name.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        self.provider
    }

    /// Storage key for an artifact.
    ///
    /// Format: `[{prefix}/]{report-kind}/{yyyy}/{mm}/{sanitized_file_name}`
    #[must_use]
    pub fn archive_key(
        prefix: Option<&str>,
        kind: ReportKind,
        at: DateTime<Utc>,
        file_name: &str,
    ) -> String {
        let base = format!(
            "{}/{:04}/{:02}/{}",
            kind,
            at.year(),
            at.month(),
            sanitize_filename(file_name)
        );
        match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{}/{base}", sanitize_path(prefix)),
            None => base,
        }
    }

    /// Writes an artifact under `key`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Storage` if the write fails.
    pub async fn put(&self, key: &str, artifact: &Artifact) -> Result<ArchivedArtifact, ExportError> {
        self.operator
            .write_with(key, artifact.bytes.clone())
            .content_type(artifact.content_type)
            .await?;
        Ok(ArchivedArtifact {
            key: key.to_owned(),
            size: artifact.bytes.len() as u64,
        })
    }

    /// Reads an archived artifact back.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Storage` if the key does not exist or cannot be read.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, ExportError> {
        Ok(self.operator.read(key).await?.to_vec())
    }
}

/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn sanitize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "..")
        .map(sanitize_filename)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::export::ExportFormat;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("sales-report.csv"), "sales-report.csv");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("ripoti ya mauzo.csv"), "ripoti_ya_mauzo.csv");
    }

    #[test]
    fn test_archive_key_layout() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(
            ExportStorage::archive_key(None, ReportKind::CashBook, at, "cash_book-report.csv"),
            "cash_book/2026/03/cash_book-report.csv"
        );
        assert_eq!(
            ExportStorage::archive_key(Some("/branch a/../x/"), ReportKind::Sales, at, "s.pdf"),
            "branch_a/x/sales/2026/03/s.pdf"
        );
    }

    #[tokio::test]
    async fn test_put_then_get_in_memory() {
        let storage = ExportStorage::in_memory().unwrap();
        let artifact = Artifact::new(ExportFormat::Csv, "sales-report.csv", b"\"A\"\n".to_vec());
        let archived = storage.put("sales/2026/03/sales-report.csv", &artifact).await.unwrap();

        assert_eq!(archived.size, 4);
        assert_eq!(storage.get(&archived.key).await.unwrap(), b"\"A\"\n");
        assert_eq!(storage.provider_name(), "memory");
    }
}
