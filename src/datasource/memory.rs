//! In-memory data source, filled programmatically or from files.

use super::{DataSource, DataSourceError};
use crate::domain::{
    AccountId, Currency, Decimal, FxRate, InstrumentMetadata, InstrumentUid, MarketSnapshot,
    Operation, Ticker,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 10;

/// Data source that serves predefined data.
///
/// Snapshot and FX lookups walk back up to `lookback_days` to the nearest
/// earlier session, like the exchange and central-bank clients do around
/// weekends and holidays.
#[derive(Debug, Clone)]
pub struct MemoryDataSource {
    operations: HashMap<AccountId, Vec<Operation>>,
    instruments: HashMap<InstrumentUid, InstrumentMetadata>,
    last_prices: HashMap<InstrumentUid, Decimal>,
    snapshots: HashMap<Ticker, BTreeMap<NaiveDate, MarketSnapshot>>,
    fx_rates: HashMap<Currency, BTreeMap<NaiveDate, Decimal>>,
    lookback_days: u32,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            instruments: HashMap::new(),
            last_prices: HashMap::new(),
            snapshots: HashMap::new(),
            fx_rates: HashMap::new(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_operation(mut self, account_id: AccountId, operation: Operation) -> Self {
        self.operations.entry(account_id).or_default().push(operation);
        self
    }

    pub fn with_operations(mut self, account_id: AccountId, operations: Vec<Operation>) -> Self {
        self.operations.entry(account_id).or_default().extend(operations);
        self
    }

    pub fn with_instrument(mut self, uid: InstrumentUid, metadata: InstrumentMetadata) -> Self {
        self.instruments.insert(uid, metadata);
        self
    }

    pub fn with_last_price(mut self, uid: InstrumentUid, price_percent: Decimal) -> Self {
        self.last_prices.insert(uid, price_percent);
        self
    }

    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshots
            .entry(snapshot.ticker.clone())
            .or_default()
            .insert(snapshot.date, snapshot);
        self
    }

    pub fn with_fx_rate(mut self, rate: FxRate) -> Self {
        self.fx_rates
            .entry(rate.currency)
            .or_default()
            .insert(rate.date, rate.rate);
        self
    }

    fn nearest_on_or_before<'a, T>(
        &self,
        series: Option<&'a BTreeMap<NaiveDate, T>>,
        date: NaiveDate,
    ) -> Option<&'a T> {
        let earliest = date - Duration::days(i64::from(self.lookback_days));
        series?.range(earliest..=date).next_back().map(|(_, v)| v)
    }
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn fetch_operations(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Operation>, DataSourceError> {
        let mut operations: Vec<Operation> = self
            .operations
            .get(account_id)
            .map(|ops| ops.iter().filter(|op| op.date >= since).cloned().collect())
            .unwrap_or_default();
        // Stable: same-timestamp operations keep their feed order.
        operations.sort_by_key(|op| op.date);
        Ok(operations)
    }

    async fn instrument_metadata(
        &self,
        instrument_uid: &InstrumentUid,
    ) -> Result<Option<InstrumentMetadata>, DataSourceError> {
        Ok(self.instruments.get(instrument_uid).cloned())
    }

    async fn market_snapshot(
        &self,
        ticker: &Ticker,
        date: NaiveDate,
    ) -> Result<Option<MarketSnapshot>, DataSourceError> {
        Ok(self
            .nearest_on_or_before(self.snapshots.get(ticker), date)
            .cloned())
    }

    async fn fx_rate(
        &self,
        currency: &Currency,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, DataSourceError> {
        Ok(self
            .nearest_on_or_before(self.fx_rates.get(currency), date)
            .copied())
    }

    async fn last_price(
        &self,
        instrument_uid: &InstrumentUid,
    ) -> Result<Option<Decimal>, DataSourceError> {
        Ok(self.last_prices.get(instrument_uid).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperationKind;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn op(day: u32) -> Operation {
        Operation::new(
            OperationKind::Buy,
            Utc.with_ymd_and_hms(2024, 3, day, 10, 0, 0).unwrap(),
            InstrumentUid::new("uid"),
        )
    }

    #[tokio::test]
    async fn test_fetch_operations_filters_and_orders() {
        let account = AccountId::new("acc");
        let source = MemoryDataSource::new().with_operations(account.clone(), vec![op(5), op(1), op(3)]);

        let since = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let ops = source.fetch_operations(&account, since).await.unwrap();
        let days: Vec<_> = ops.iter().map(|o| o.date.format("%d").to_string()).collect();
        assert_eq!(days, vec!["03", "05"]);

        let other = source
            .fetch_operations(&AccountId::new("other"), since)
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_walks_back_to_previous_session() {
        let ticker = Ticker::new("RU000A1");
        let friday = MarketSnapshot::new(ticker.clone(), date("2024-03-01"));
        let source = MemoryDataSource::new().with_snapshot(friday.clone());

        let sunday = source.market_snapshot(&ticker, date("2024-03-03")).await.unwrap();
        assert_eq!(sunday, Some(friday));

        let before = source.market_snapshot(&ticker, date("2024-02-28")).await.unwrap();
        assert_eq!(before, None);
    }

    #[tokio::test]
    async fn test_lookback_is_bounded() {
        let source = MemoryDataSource::new()
            .with_lookback_days(2)
            .with_fx_rate(FxRate {
                currency: Currency::new("usd"),
                date: date("2024-03-01"),
                rate: Decimal::from(90),
            });
        let usd = Currency::new("usd");

        assert_eq!(
            source.fx_rate(&usd, date("2024-03-03")).await.unwrap(),
            Some(Decimal::from(90))
        );
        assert_eq!(source.fx_rate(&usd, date("2024-03-04")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_reference_data_is_none() {
        let source = MemoryDataSource::new();
        let uid = InstrumentUid::new("nope");
        assert_eq!(source.instrument_metadata(&uid).await.unwrap(), None);
        assert_eq!(source.last_price(&uid).await.unwrap(), None);
    }
}
