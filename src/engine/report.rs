//! Per-lot profitability and yield report.

use crate::domain::{Currency, Decimal, Lot, MarketSnapshot, Ticker};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EngineError, TaxPolicy};

/// Profit of one lot, before and after tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profit {
    pub before_tax: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
    /// Whole hours between purchase and sale (or `now` for open lots).
    pub holding_hours: i64,
}

impl Profit {
    pub fn holding_days(&self) -> i64 {
        self.holding_hours / 24
    }
}

/// Profit of `lot` as of `now`.
pub fn profit(lot: &Lot, now: DateTime<Utc>, policy: &TaxPolicy) -> Profit {
    let before_tax = (lot.sell_price - lot.buy_price) * lot.quantity + lot.sell_accrued_interest
        - lot.buy_accrued_interest
        + lot.total_coupon
        + lot.total_dividend
        + lot.total_commission
        + lot.partial_early_repayment;

    let end = lot.sell_date.unwrap_or(now);
    let holding_hours = (end - lot.buy_date).num_hours();
    let tax = policy.tax_for(before_tax, holding_hours);

    Profit {
        before_tax,
        tax,
        net: before_tax - tax,
        holding_hours,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondReport {
    pub name: String,
    pub ticker: Ticker,
    pub currency: Currency,
    pub replaced: bool,
    pub quantity: Decimal,
    pub buy_date: DateTime<Utc>,
    pub sell_date: Option<DateTime<Utc>>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub maturity_date: Option<NaiveDate>,
    pub offer_date: Option<NaiveDate>,
    pub duration: Option<Decimal>,
    pub yield_to_maturity: Option<Decimal>,
    pub yield_to_offer: Option<Decimal>,
    pub yield_to_maturity_on_purchase: Option<Decimal>,
    pub yield_to_offer_on_purchase: Option<Decimal>,
    pub profit_before_tax: Decimal,
    pub tax: Decimal,
    /// Net of tax.
    pub profit: Decimal,
    pub profit_in_percentage: Decimal,
    /// `None` when the compounded figure does not fit a decimal, which
    /// happens for large gains over a few days.
    pub annualized_return: Option<Decimal>,
}

/// Combine a lot with the market at purchase and at valuation time.
pub fn build_report(
    lot: &Lot,
    market_at_buy: &MarketSnapshot,
    market_at_now: &MarketSnapshot,
    now: DateTime<Utc>,
    policy: &TaxPolicy,
) -> Result<BondReport, EngineError> {
    let profit = profit(lot, now, policy);
    let invested = lot.invested();
    let profit_in_percentage = percentage(profit.net, invested)?;
    let annualized_return = annualized_return(profit.net, invested, profit.holding_days())?;

    let name = market_at_now
        .short_name
        .cloned_value()
        .unwrap_or_else(|| lot.name.clone());

    Ok(BondReport {
        name,
        ticker: lot.ticker.clone(),
        currency: lot.currency.clone(),
        replaced: lot.replaced,
        quantity: lot.quantity,
        buy_date: lot.buy_date,
        sell_date: lot.sell_date,
        buy_price: lot.buy_price,
        sell_price: lot.sell_price,
        maturity_date: market_at_now.maturity_date.cloned_value(),
        offer_date: market_at_now.offer_date.cloned_value(),
        duration: market_at_now.duration.cloned_value(),
        yield_to_maturity: market_at_now.yield_to_maturity.cloned_value(),
        yield_to_offer: market_at_now.yield_to_offer.cloned_value(),
        yield_to_maturity_on_purchase: market_at_buy.yield_to_maturity.cloned_value(),
        yield_to_offer_on_purchase: market_at_buy.yield_to_offer.cloned_value(),
        profit_before_tax: profit.before_tax.round2(),
        tax: profit.tax.round2(),
        profit: profit.net.round2(),
        profit_in_percentage,
        annualized_return,
    })
}

/// `part / whole` in percent, rounded to cents.
pub(crate) fn percentage(part: Decimal, whole: Decimal) -> Result<Decimal, EngineError> {
    part.checked_div(whole)
        .map(|ratio| (ratio * Decimal::hundred()).round2())
        .ok_or(EngineError::DivisionByZero {
            context: "percentage of a zero amount",
        })
}

/// Compound annual return of `net` on `invested` over `holding_days`.
fn annualized_return(
    net: Decimal,
    invested: Decimal,
    holding_days: i64,
) -> Result<Option<Decimal>, EngineError> {
    let ratio = net.checked_div(invested).ok_or(EngineError::DivisionByZero {
        context: "annualized return of a zero investment",
    })?;
    let base = (Decimal::one() + ratio).to_f64();
    if base <= 0.0 {
        return Ok(Some(-Decimal::hundred()));
    }

    let days = holding_days.max(1) as f64;
    let growth = base.powf(365.0 / days);
    // Cut binary noise before the half-away-from-zero cents rounding.
    Ok(Decimal::from_f64(growth).and_then(|g| {
        g.round_dp(10)
            .checked_sub(Decimal::one())?
            .checked_mul(Decimal::hundred())
            .map(|percent| percent.round2())
    }))
}
