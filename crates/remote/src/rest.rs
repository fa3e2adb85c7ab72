//! PostgREST-style data store client.

use std::time::Duration;

use async_trait::async_trait;
use kabati_core::store::{DataStore, FilterOp, Projection, Query, Record, StoreError};
use kabati_shared::config::StoreConfig;
use kabati_shared::types::PageRequest;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

/// Primary key appended to every paged walk's ordering.
const TIEBREAK_COLUMN: &str = "id";

/// Reads tables from a hosted PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    timeout: Duration,
}

impl RestStore {
    /// Creates a client for `base_url` (e.g. `https://<project>/rest/v1`).
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            page_size: PageRequest::default().per_page,
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates a client from the `store` config section.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.url, &config.api_key)
            .with_page_size(config.page_size)
            .with_timeout(config.fetch_timeout())
    }

    /// Rows requested per round trip.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_page(
        &self,
        query: &Query,
        params: &[(String, String)],
        page: PageRequest,
    ) -> Result<Vec<Record>, StoreError> {
        let url = format!("{}/{}", self.base_url, query.table);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(params)
            .query(&[("limit", page.limit()), ("offset", page.offset())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::transport(&query.table, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(StoreError::rejected(&query.table, status.as_u16(), body));
        }

        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::decode(&query.table, e.to_string()))
    }
}

#[async_trait]
impl DataStore for RestStore {
    /// Pages through the result with `limit`/`offset` until a short page
    /// arrives or the query's own limit is reached.
    #[instrument(skip(self, query), fields(table = %query.table), err)]
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let params = paging_params(query);
        let cap = query.limit.map(|limit| limit as usize);
        let per_page = query.limit.map_or(self.page_size, |l| l.clamp(1, self.page_size));

        let mut page = PageRequest::first(per_page);
        let mut rows = Vec::new();
        loop {
            let batch = self.fetch_page(query, &params, page).await?;
            let received = batch.len();
            rows.extend(batch);
            if page.is_last(received) || cap.is_some_and(|cap| rows.len() >= cap) {
                break;
            }
            page = page.next();
        }
        if let Some(cap) = cap {
            rows.truncate(cap);
        }

        debug!(rows = rows.len(), pages = page.page, "rows fetched");
        Ok(rows)
    }
}

/// Renders a query as PostgREST query parameters, without paging.
///
/// ```text
/// select=id,amount,client:clients!client_id(name)
/// date_created=gte.2026-03-01T00:00:00+00:00
/// client_id=is.null
/// order=date_created.asc,id.desc
/// ```
#[must_use]
pub fn render_query(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(query.filters.len() + 2);

    let select = if query.columns.is_empty() {
        "*".to_owned()
    } else {
        query
            .columns
            .iter()
            .map(|projection| match projection {
                Projection::Column(name) => name.clone(),
                Projection::Embed {
                    alias,
                    table,
                    foreign_key,
                    columns,
                } => format!("{alias}:{table}!{foreign_key}({})", columns.join(",")),
            })
            .collect::<Vec<_>>()
            .join(",")
    };
    params.push(("select".to_owned(), select));

    for filter in &query.filters {
        let rendered = match &filter.op {
            FilterOp::Eq(v) => format!("eq.{}", scalar(v)),
            FilterOp::Neq(v) => format!("neq.{}", scalar(v)),
            FilterOp::Gt(v) => format!("gt.{}", scalar(v)),
            FilterOp::Gte(v) => format!("gte.{}", scalar(v)),
            FilterOp::Lt(v) => format!("lt.{}", scalar(v)),
            FilterOp::Lte(v) => format!("lte.{}", scalar(v)),
            FilterOp::In(values) => format!(
                "in.({})",
                values.iter().map(list_item).collect::<Vec<_>>().join(",")
            ),
            FilterOp::IsNull => "is.null".to_owned(),
            FilterOp::NotNull => "not.is.null".to_owned(),
        };
        params.push((filter.column.clone(), rendered));
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_owned(), order));
    }

    params
}

/// Query parameters for a paged walk. Offsets are only stable under a total
/// order, so the primary key is appended unless the query already sorts on it.
fn paging_params(query: &Query) -> Vec<(String, String)> {
    let mut params = render_query(query);
    let tiebreak = format!("{TIEBREAK_COLUMN}.asc");
    match params.iter_mut().find(|(key, _)| key == "order") {
        Some((_, order)) => {
            if !query.order.iter().any(|o| o.column == TIEBREAK_COLUMN) {
                order.push(',');
                order.push_str(&tiebreak);
            }
        }
        None => params.push(("order".to_owned(), tiebreak)),
    }
    params
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

/// Items inside `in.(...)` are quoted when they contain reserved characters.
fn list_item(value: &Value) -> String {
    let text = scalar(value);
    if text.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text
    }
}
