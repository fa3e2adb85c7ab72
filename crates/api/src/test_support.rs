//! Router fixtures for route tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono_tz::Africa::Nairobi;
use http_body_util::BodyExt;
use kabati_core::export::{ExportStorage, PrintOptions};
use kabati_core::orchestrator::OrchestratorSettings;
use kabati_core::period::PeriodResolver;
use kabati_core::store::MemoryStore;
use kabati_shared::types::Currency;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, ReportServices, create_router};

pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_table("clients", vec![])
        .with_table(
            "expenses",
            vec![
                json!({"id": 1, "expense_number": "EXP-001", "category": "Rent", "description": "March rent", "amount": 50000, "client_id": null, "date_created": "2026-03-01T08:00:00Z"}),
                json!({"id": 2, "expense_number": "EXP-002", "category": "Power", "description": "Tokens", "amount": "4,500", "client_id": null, "date_created": "2026-03-10T08:00:00Z"}),
            ],
        )
}

pub fn services(store: MemoryStore, storage: Option<ExportStorage>) -> ReportServices {
    let settings = OrchestratorSettings {
        fetch_timeout: Duration::from_secs(5),
        print: PrintOptions {
            company_name: "Kabati Workshop".into(),
            currency: Currency::Kes,
            stylesheet_href: None,
            auto_print: false,
            tz: Nairobi,
        },
    };
    let services = ReportServices::new(Arc::new(store), PeriodResolver::new(Nairobi), settings);
    match storage {
        Some(storage) => services.with_storage(storage),
        None => services,
    }
}

pub fn state_with(store: MemoryStore, storage: Option<ExportStorage>) -> AppState {
    AppState::new(services(store, storage))
}

pub fn state() -> AppState {
    state_with(store(), None)
}

pub async fn send(state: AppState, method: &str, uri: &str) -> (StatusCode, String) {
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_text(response.into_body()).await)
}

pub async fn get(state: AppState, uri: &str) -> (StatusCode, String) {
    send(state, "GET", uri).await
}

pub async fn body_text(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn body_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}
