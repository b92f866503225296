use crate::orchestration::{IngestionError, ReportingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),
    #[error("Reporting failed: {0}")]
    Reporting(#[from] ReportingError),
    #[error("Failed to serialize report: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    /// True when the failure is an absent quote, snapshot or instrument
    /// rather than a broken ledger invariant.
    pub fn is_missing_data(&self) -> bool {
        let engine = match self {
            AppError::Ingestion(IngestionError::Engine { source, .. }) => source,
            AppError::Reporting(ReportingError::Engine(source)) => source,
            _ => return false,
        };
        !engine.is_invariant_violation()
    }
}
