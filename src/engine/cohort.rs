//! Ticker cohorts: all open lots of one bond blended into one row.

use std::collections::BTreeMap;

use crate::domain::{Currency, Decimal, Lot, MarketSnapshot, Ticker};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::report::{percentage, profit};
use super::{EngineError, TaxPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralBondReportPosition {
    pub name: String,
    pub ticker: Ticker,
    pub currency: Currency,
    pub replaced: bool,
    pub quantity: Decimal,
    /// Quantity-weighted average buy price.
    pub position_price: Decimal,
    /// Earliest buy date across the cohort.
    pub buy_date: DateTime<Utc>,
    /// Nearest of buyback, offer and maturity.
    pub redemption_date: Option<NaiveDate>,
    pub duration: Option<Decimal>,
    pub current_yield: Option<Decimal>,
    pub yield_on_purchase: Option<Decimal>,
    /// Net of tax, summed over lots.
    pub profit: Decimal,
    pub profit_in_percentage: Decimal,
    pub percent_of_portfolio: Decimal,
}

/// Blend the lots of one ticker.
///
/// `total_portfolio_value` is the invested amount of the whole portfolio,
/// see [`portfolio_value`].
pub fn aggregate(
    lots: &[&Lot],
    total_portfolio_value: Decimal,
    market_at_first_buy: &MarketSnapshot,
    market_at_now: &MarketSnapshot,
    now: DateTime<Utc>,
    policy: &TaxPolicy,
) -> Result<GeneralBondReportPosition, EngineError> {
    let first = lots.first().ok_or(EngineError::EmptyCohort)?;

    let mut invested = Decimal::zero();
    let mut quantity = Decimal::zero();
    let mut net_profit = Decimal::zero();
    let mut buy_date = first.buy_date;
    for lot in lots {
        invested += lot.invested();
        quantity += lot.quantity;
        net_profit += profit(lot, now, policy).net;
        buy_date = buy_date.min(lot.buy_date);
    }

    let position_price = invested
        .checked_div(quantity)
        .ok_or(EngineError::DivisionByZero {
            context: "position price of a cohort with zero quantity",
        })?
        .round2();

    let name = market_at_now
        .short_name
        .cloned_value()
        .unwrap_or_else(|| first.name.clone());

    Ok(GeneralBondReportPosition {
        name,
        ticker: first.ticker.clone(),
        currency: first.currency.clone(),
        replaced: first.replaced,
        quantity,
        position_price,
        buy_date,
        redemption_date: market_at_now.nearest_redemption_date(),
        duration: market_at_now.duration.cloned_value(),
        current_yield: market_at_now.preferred_yield(),
        yield_on_purchase: market_at_first_buy.preferred_yield(),
        profit: net_profit.round2(),
        profit_in_percentage: percentage(net_profit, invested)?,
        percent_of_portfolio: percentage(invested, total_portfolio_value)?,
    })
}

/// Open lots grouped by ticker, in ticker order; FIFO order is kept inside.
pub fn group_by_ticker<'a, I>(lots: I) -> BTreeMap<Ticker, Vec<&'a Lot>>
where
    I: IntoIterator<Item = &'a Lot>,
{
    let mut cohorts: BTreeMap<Ticker, Vec<&'a Lot>> = BTreeMap::new();
    for lot in lots {
        cohorts.entry(lot.ticker.clone()).or_default().push(lot);
    }
    cohorts
}

/// Total invested amount across `lots`.
pub fn portfolio_value<'a, I>(lots: I) -> Decimal
where
    I: IntoIterator<Item = &'a Lot>,
{
    lots.into_iter().map(Lot::invested).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Nullable;
    use chrono::{Duration, TimeZone};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn t(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap() + Duration::days(day)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lot(ticker: &str, day: i64, quantity: &str, buy_price: &str) -> Lot {
        Lot {
            name: ticker.to_string(),
            ticker: Ticker::new(ticker),
            buy_date: t(day),
            quantity: d(quantity),
            buy_price: d(buy_price),
            sell_price: d(buy_price),
            ..Default::default()
        }
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(Ticker::new("A"), date("2024-06-01"))
    }

    #[test]
    fn test_position_price_is_weighted() {
        let a = lot("A", 0, "10", "1000");
        let b = lot("A", 5, "5", "1100");
        let total = portfolio_value([&a, &b]);

        let row = aggregate(&[&a, &b], total, &snapshot(), &snapshot(), t(30), &TaxPolicy::default())
            .unwrap();
        assert_eq!(row.quantity, d("15"));
        assert_eq!(row.position_price, d("1033.33"));
        assert_eq!(row.percent_of_portfolio, d("100"));
        assert_eq!(row.profit, Decimal::zero());
    }

    #[test]
    fn test_profit_is_net_of_tax_and_relative_to_invested() {
        let mut a = lot("A", 0, "10", "1000");
        a.sell_price = d("1100");
        let mut b = lot("A", 1, "10", "1000");
        b.sell_price = d("1100");
        let other = lot("B", 0, "20", "1000");
        let total = portfolio_value([&a, &b, &other]);

        let row = aggregate(&[&a, &b], total, &snapshot(), &snapshot(), t(30), &TaxPolicy::default())
            .unwrap();
        assert_eq!(row.profit, d("1740"));
        assert_eq!(row.profit_in_percentage, d("8.7"));
        assert_eq!(row.percent_of_portfolio, d("50"));
    }

    #[test]
    fn test_buy_date_is_true_minimum() {
        let newer = lot("A", 9, "1", "1000");
        let older = lot("A", 2, "1", "1000");
        let row = aggregate(
            &[&newer, &older],
            d("2000"),
            &snapshot(),
            &snapshot(),
            t(30),
            &TaxPolicy::default(),
        )
        .unwrap();
        assert_eq!(row.buy_date, t(2));
    }

    #[test]
    fn test_dates_and_yields_come_from_snapshots() {
        let a = lot("A", 0, "1", "1000");
        let mut at_first_buy = snapshot();
        at_first_buy.yield_to_maturity = Nullable::Value(d("11"));
        let mut at_now = snapshot();
        at_now.maturity_date = Nullable::Value(date("2031-01-01"));
        at_now.offer_date = Nullable::Value(date("2026-09-01"));
        at_now.buyback_date = Nullable::Value(date("2026-03-01"));
        at_now.yield_to_maturity = Nullable::Value(d("12"));
        at_now.yield_to_offer = Nullable::Value(d("14"));
        at_now.short_name = Nullable::Value("Bond A".to_string());

        let row = aggregate(&[&a], d("1000"), &at_first_buy, &at_now, t(1), &TaxPolicy::default())
            .unwrap();
        assert_eq!(row.name, "Bond A");
        assert_eq!(row.redemption_date, Some(date("2026-03-01")));
        assert_eq!(row.current_yield, Some(d("14")));
        assert_eq!(row.yield_on_purchase, Some(d("11")));
    }

    #[test]
    fn test_empty_cohort_fails() {
        let err = aggregate(&[], d("1000"), &snapshot(), &snapshot(), t(0), &TaxPolicy::default())
            .unwrap_err();
        assert_eq!(err, EngineError::EmptyCohort);
    }

    #[test]
    fn test_zero_portfolio_value_fails() {
        let a = lot("A", 0, "1", "1000");
        let err = aggregate(&[&a], Decimal::zero(), &snapshot(), &snapshot(), t(1), &TaxPolicy::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero { .. }));
    }

    #[test]
    fn test_group_by_ticker_keeps_fifo_order() {
        let lots = vec![lot("B", 0, "1", "1"), lot("A", 1, "1", "1"), lot("B", 2, "1", "1")];
        let cohorts = group_by_ticker(&lots);
        let tickers: Vec<_> = cohorts.keys().map(|t| t.as_str().to_string()).collect();
        assert_eq!(tickers, vec!["A", "B"]);
        let b = &cohorts[&Ticker::new("B")];
        assert_eq!(b[0].buy_date, t(0));
        assert_eq!(b[1].buy_date, t(2));
    }
}
