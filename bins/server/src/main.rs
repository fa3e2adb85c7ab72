//! Kabati Reports Server
//!
//! Main entry point for the report pipeline service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kabati_api::{AppState, ReportServices, create_router};
use kabati_core::export::{ExportStorage, PrintOptions};
use kabati_core::orchestrator::OrchestratorSettings;
use kabati_core::period::PeriodResolver;
use kabati_remote::{HttpPdfRenderer, RestStore};
use kabati_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kabati=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    let tz = config.reports.tz()?;

    // Hosted data store
    let store = RestStore::from_config(&config.store);
    info!(url = %config.store.url, page_size = config.store.page_size, "Data store configured");

    let resolver = PeriodResolver::new(tz)
        .with_epoch(config.reports.epoch)
        .with_week_start(config.reports.week_start()?);

    let settings = OrchestratorSettings {
        fetch_timeout: config.store.fetch_timeout(),
        print: PrintOptions {
            company_name: config.reports.company_name.clone(),
            currency: config.reports.currency()?,
            stylesheet_href: config.reports.stylesheet_href.clone(),
            auto_print: true,
            tz,
        },
    };

    let mut services = ReportServices::new(Arc::new(store), resolver, settings);

    // PDF generation service (optional)
    match HttpPdfRenderer::from_config(&config.pdf) {
        Some(renderer) => {
            info!("PDF export enabled");
            services = services.with_pdf_renderer(Arc::new(renderer));
        }
        None => warn!("PDF endpoint not configured, PDF export disabled"),
    }

    // Archive storage (optional)
    if let Some(storage_config) = &config.storage {
        let storage = ExportStorage::from_config(storage_config)?;
        info!(provider = storage.provider_name(), "Archive storage configured");
        services = services.with_storage(storage);
    }

    // Create router
    let app = create_router(AppState::new(services));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
