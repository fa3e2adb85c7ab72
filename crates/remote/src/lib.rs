//! HTTP clients for Kabati's hosted collaborators.
//!
//! - [`RestStore`] implements the core `DataStore` trait against a
//!   PostgREST-style endpoint.
//! - [`HttpPdfRenderer`] implements `PdfRenderer` by posting the report
//!   payload to a PDF generation service.

pub mod pdf;
pub mod rest;

pub use pdf::HttpPdfRenderer;
pub use rest::{RestStore, render_query};
