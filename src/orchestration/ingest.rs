use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{AccountId, InstrumentUid, Operation, OperationCategory, OperationKind};
use crate::engine::{Applied, Book, BuyPriceOverrides, EngineError, ReferenceData};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Replays an account's operation feed into a [`Book`].
#[derive(Clone)]
pub struct Ingestor {
    datasource: Arc<dyn DataSource>,
    overrides: BuyPriceOverrides,
}

impl Ingestor {
    pub fn new(datasource: Arc<dyn DataSource>, overrides: BuyPriceOverrides) -> Self {
        Self {
            datasource,
            overrides,
        }
    }

    /// Fetch operations from `since` and apply them in feed order.
    ///
    /// Stops at the first operation the engine rejects; everything before it
    /// stays applied.
    pub async fn build_book(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<(Book, IngestionResult), IngestionError> {
        let operations = self.datasource.fetch_operations(account_id, since).await?;
        let mut book = Book::with_overrides(account_id.clone(), self.overrides.clone());
        let mut result = IngestionResult {
            operations_fetched: operations.len(),
            ..Default::default()
        };

        for operation in &operations {
            let reference = match operation.kind.category() {
                OperationCategory::Open => self.resolve_reference(operation).await?,
                _ => ReferenceData::default(),
            };

            match book.apply(operation, &reference) {
                Ok(Applied::Skipped) => result.operations_skipped += 1,
                Ok(_) => result.operations_applied += 1,
                Err(source) => {
                    tracing::warn!(
                        account = %account_id,
                        instrument = %operation.instrument_uid,
                        code = operation.kind.code(),
                        error = %source,
                        "Operation rejected by ledger"
                    );
                    return Err(IngestionError::Engine {
                        kind: operation.kind,
                        date: operation.date,
                        instrument: operation.instrument_uid.clone(),
                        source,
                    });
                }
            }
        }

        tracing::info!(
            "Ingested account {}: {} fetched, {} applied, {} skipped, {} open lots, {} realized slices",
            account_id,
            result.operations_fetched,
            result.operations_applied,
            result.operations_skipped,
            book.open_lots().count(),
            book.closed_lots().count()
        );

        Ok((book, result))
    }

    /// Metadata and last price for an opening operation, plus the FX rate on
    /// the operation date when the bond was redenominated.
    async fn resolve_reference(&self, operation: &Operation) -> Result<ReferenceData, IngestionError> {
        let uid = &operation.instrument_uid;
        let (metadata, last_price) = futures::try_join!(
            self.datasource.instrument_metadata(uid),
            self.datasource.last_price(uid)
        )?;

        let fx_rate = match &metadata {
            Some(meta) if meta.replaced => {
                self.datasource
                    .fx_rate(&meta.nominal.currency, operation.date.date_naive())
                    .await?
            }
            _ => None,
        };

        Ok(ReferenceData {
            metadata,
            last_price,
            fx_rate,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    pub operations_fetched: usize,
    pub operations_applied: usize,
    pub operations_skipped: usize,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("{kind:?} operation on {date} for {instrument}: {source}")]
    Engine {
        kind: OperationKind,
        date: DateTime<Utc>,
        instrument: InstrumentUid,
        #[source]
        source: EngineError,
    },
}
