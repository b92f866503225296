pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, ReportMode};
pub use datasource::{DataSource, DataSourceError, MemoryDataSource};
pub use domain::{
    AccountId, Currency, Decimal, Figi, InstrumentUid, Lot, MarketSnapshot, Nullable, Operation,
    OperationKind, Ticker,
};
pub use engine::{BondReport, Book, EngineError, GeneralBondReportPosition, Ledger, TaxPolicy};
pub use error::AppError;
pub use orchestration::{Ingestor, Reporter};

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Replay the configured account and render the selected report as JSON.
pub async fn run(
    config: &Config,
    datasource: Arc<dyn DataSource>,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let ingestor = Ingestor::new(Arc::clone(&datasource), config.buy_price_overrides.clone());
    let reporter = Reporter::new(datasource, config.tax_policy);

    let (mut book, _) = ingestor
        .build_book(&config.account_id, DateTime::<Utc>::UNIX_EPOCH)
        .await?;
    reporter.revalue(&mut book, now).await?;

    let json = match config.report_mode {
        ReportMode::Lots => serde_json::to_string_pretty(&reporter.lot_reports(&book, now).await?)?,
        ReportMode::General => {
            serde_json::to_string_pretty(&reporter.general_report(&book, now).await?)?
        }
    };
    Ok(json)
}
