//! Data source abstraction for the brokerage feed and reference data.

use crate::domain::{
    AccountId, Currency, Decimal, InstrumentMetadata, InstrumentUid, MarketSnapshot, Operation,
    Ticker,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

pub mod file;
pub mod memory;

pub use memory::MemoryDataSource;

/// Collaborators the ledger needs: the operations feed, instrument metadata,
/// exchange snapshots, central-bank FX and last prices.
///
/// Lookups return `Ok(None)` when the provider has no data; implementations
/// that walk back to the nearest trading session do so before giving up.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch operations of an account from `since` (inclusive).
    ///
    /// # Returns
    /// Operations in ascending date order; the ledger does not re-sort.
    async fn fetch_operations(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Operation>, DataSourceError>;

    /// Static attributes of an instrument.
    async fn instrument_metadata(
        &self,
        instrument_uid: &InstrumentUid,
    ) -> Result<Option<InstrumentMetadata>, DataSourceError>;

    /// Bond market data for the session on (or nearest before) `date`.
    async fn market_snapshot(
        &self,
        ticker: &Ticker,
        date: NaiveDate,
    ) -> Result<Option<MarketSnapshot>, DataSourceError>;

    /// Official rate of one unit of `currency` on (or nearest before) `date`.
    async fn fx_rate(
        &self,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError>;

    /// Last trade price in percent of nominal.
    async fn last_price(
        &self,
        instrument_uid: &InstrumentUid,
    ) -> Result<Option<Decimal>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON, CSV or malformed values)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
