//! Application configuration management.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::types::money::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Hosted data store configuration.
    pub store: StoreConfig,
    /// Report presentation and calendar configuration.
    #[serde(default)]
    pub reports: ReportsConfig,
    /// PDF generation service configuration.
    #[serde(default)]
    pub pdf: PdfConfig,
    /// Object storage for archived exports (optional).
    #[serde(default)]
    pub storage: Option<StorageConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Hosted data store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the REST endpoint (e.g. `https://xyz.supabase.co/rest/v1`).
    pub url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Upper bound on the whole fan-out fetch of one report.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Rows requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl StoreConfig {
    /// Returns the fetch timeout as a `Duration`.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    1000
}

/// Report presentation and calendar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// IANA timezone that anchors day/week/month boundaries.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// ISO 4217 code used when formatting amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Name printed in report headers.
    #[serde(default = "default_company_name")]
    pub company_name: String,
    /// Earliest date covered by the `all` preset.
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,
    /// First day of the week for week presets.
    #[serde(default = "default_week_start")]
    pub week_start: String,
    /// Stylesheet linked from printable documents.
    #[serde(default)]
    pub stylesheet_href: Option<String>,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            currency: default_currency(),
            company_name: default_company_name(),
            epoch: default_epoch(),
            week_start: default_week_start(),
            stylesheet_href: None,
        }
    }
}

impl ReportsConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA timezone.
    pub fn tz(&self) -> Result<Tz, config::ConfigError> {
        Tz::from_str(&self.timezone).map_err(|e| {
            config::ConfigError::Message(format!("invalid timezone {}: {e}", self.timezone))
        })
    }

    /// Parses the configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not a supported currency.
    pub fn currency(&self) -> Result<Currency, config::ConfigError> {
        Currency::from_str(&self.currency).map_err(config::ConfigError::Message)
    }

    /// Parses the configured week start.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a weekday name.
    pub fn week_start(&self) -> Result<Weekday, config::ConfigError> {
        Weekday::from_str(&self.week_start).map_err(|_| {
            config::ConfigError::Message(format!("invalid week start: {}", self.week_start))
        })
    }
}

fn default_timezone() -> String {
    "Africa/Nairobi".to_string()
}

fn default_currency() -> String {
    "KES".to_string()
}

fn default_company_name() -> String {
    "Kabati Workshop".to_string()
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_week_start() -> String {
    "monday".to_string()
}

/// PDF generation service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    /// Endpoint that accepts the report payload and answers with PDF bytes.
    /// PDF export is disabled when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_pdf_timeout")]
    pub timeout_secs: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_pdf_timeout(),
        }
    }
}

impl PdfConfig {
    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_pdf_timeout() -> u64 {
    60
}

/// Object storage provider for archived exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KABATI").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
