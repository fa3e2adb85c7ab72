//! Data-store collaborator.
//!
//! Report code depends only on this capability set: table selection with
//! projection, equality/range/membership predicates, ordering, and embedding a
//! related row by foreign key. Wire protocols live behind [`DataStore`].

pub mod error;
pub mod memory;
pub mod query;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Filter, FilterOp, OrderBy, Projection, Query};

/// One row as returned by the store. Embedded relations are nested objects.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Read-only access to the hosted tables.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Runs a query and returns every matching row, in the query's order.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` naming the table if the query fails.
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError>;
}
