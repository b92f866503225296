use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{InstrumentUid, MarketSnapshot, Ticker};
use crate::engine::{
    aggregate, build_report, group_by_ticker, portfolio_value, BondReport, Book, EngineError,
    GeneralBondReportPosition, TaxPolicy,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Values a [`Book`] against market data and renders its reports.
#[derive(Clone)]
pub struct Reporter {
    datasource: Arc<dyn DataSource>,
    policy: TaxPolicy,
}

impl Reporter {
    pub fn new(datasource: Arc<dyn DataSource>, policy: TaxPolicy) -> Self {
        Self { datasource, policy }
    }

    /// Refresh open lots from the last price and, when the session snapshot
    /// carries it, the per-bond accrued interest as of `now`.
    pub async fn revalue(&self, book: &mut Book, now: DateTime<Utc>) -> Result<(), ReportingError> {
        let open: Vec<(InstrumentUid, Ticker)> = book
            .ledgers()
            .filter_map(|ledger| {
                let lot = ledger.lots().first()?;
                Some((ledger.instrument_uid().clone(), lot.ticker.clone()))
            })
            .collect();

        for (uid, ticker) in &open {
            let (price, snapshot) = futures::try_join!(
                self.datasource.last_price(uid),
                self.datasource.market_snapshot(ticker, now.date_naive())
            )?;
            let price = price.ok_or_else(|| EngineError::missing("last price", uid.as_str(), None))?;
            let accrued_interest = snapshot.and_then(|s| s.accrued_interest.cloned_value());
            book.mark_to_market(uid, price, accrued_interest);
        }
        tracing::debug!("Revalued {} open instruments", open.len());
        Ok(())
    }

    /// One report per lot, per instrument: realized slices in the order they
    /// were closed, then open lots in FIFO order.
    ///
    /// A realized slice is read against the market on its sell date.
    pub async fn lot_reports(
        &self,
        book: &Book,
        now: DateTime<Utc>,
    ) -> Result<Vec<BondReport>, ReportingError> {
        let lots = book
            .ledgers()
            .flat_map(|ledger| ledger.closed().iter().chain(ledger.lots()));

        let mut reports = Vec::new();
        let mut realized = 0;
        for lot in lots {
            if lot.is_closed() {
                realized += 1;
            }
            let valued_at = lot.sell_date.unwrap_or(now);
            let (at_buy, at_valuation) = futures::try_join!(
                self.snapshot(&lot.ticker, lot.buy_date.date_naive()),
                self.snapshot(&lot.ticker, valued_at.date_naive())
            )?;
            reports.push(build_report(lot, &at_buy, &at_valuation, now, &self.policy)?);
        }
        tracing::info!(
            account = %book.account_id(),
            "Built {} lot reports, {} realized",
            reports.len(),
            realized
        );
        Ok(reports)
    }

    /// One row per ticker, with the portfolio share of each.
    pub async fn general_report(
        &self,
        book: &Book,
        now: DateTime<Utc>,
    ) -> Result<Vec<GeneralBondReportPosition>, ReportingError> {
        let total = portfolio_value(book.open_lots());
        let mut positions = Vec::new();

        for (ticker, lots) in group_by_ticker(book.open_lots()) {
            let first_buy = lots
                .iter()
                .map(|lot| lot.buy_date)
                .min()
                .ok_or(EngineError::EmptyCohort)?;
            let (at_first_buy, at_now) = futures::try_join!(
                self.snapshot(&ticker, first_buy.date_naive()),
                self.snapshot(&ticker, now.date_naive())
            )?;
            positions.push(aggregate(
                &lots,
                total,
                &at_first_buy,
                &at_now,
                now,
                &self.policy,
            )?);
        }

        tracing::info!("Built {} cohort positions", positions.len());
        Ok(positions)
    }

    async fn snapshot(&self, ticker: &Ticker, date: NaiveDate) -> Result<MarketSnapshot, ReportingError> {
        match self.datasource.market_snapshot(ticker, date).await? {
            Some(snapshot) => Ok(snapshot),
            None => {
                tracing::warn!(ticker = %ticker, %date, "No market snapshot");
                Err(EngineError::missing("market snapshot", ticker.as_str(), Some(date)).into())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
