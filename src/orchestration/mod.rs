//! Async drivers that feed the engine from a [`DataSource`](crate::datasource::DataSource).

pub mod ingest;
pub mod reporting;

pub use ingest::{IngestionError, IngestionResult, Ingestor};
pub use reporting::{Reporter, ReportingError};
