//! Tax lot: one purchase that is still (partially) open.

use crate::domain::{Currency, Decimal, Figi, InstrumentUid, Ticker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One FIFO tax lot with the cash-flows accumulated since it was opened.
///
/// All accumulators are signed the way the brokerage reports them:
/// coupons and repayments are positive, commissions and taxes negative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lot {
    pub instrument_uid: InstrumentUid,
    pub figi: Figi,
    pub name: String,
    pub ticker: Ticker,
    pub class_code: String,
    pub currency: Currency,
    pub replaced: bool,
    pub buy_date: DateTime<Utc>,
    /// Set on realized slices only.
    pub sell_date: Option<DateTime<Utc>>,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    /// Exit price for a realized slice, current market price otherwise.
    pub sell_price: Decimal,
    pub nominal: Decimal,
    pub buy_accrued_interest: Decimal,
    pub sell_accrued_interest: Decimal,
    pub total_coupon: Decimal,
    pub total_dividend: Decimal,
    pub total_commission: Decimal,
    pub partial_early_repayment: Decimal,
    pub paid_tax: Decimal,
}

impl Lot {
    /// Amount paid for the remaining quantity, excluding accrued interest.
    pub fn invested(&self) -> Decimal {
        self.buy_price * self.quantity
    }

    pub fn is_closed(&self) -> bool {
        self.sell_date.is_some()
    }

    /// Scale the cost-side accumulators that shrink with the lot on a partial sell.
    pub(crate) fn scale_cost_basis(&mut self, factor: Decimal) {
        self.total_commission *= factor;
        self.paid_tax *= factor;
        self.buy_accrued_interest *= factor;
    }
}
