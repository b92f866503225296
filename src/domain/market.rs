//! Reference data snapshots supplied by the exchange, the broker and the
//! central bank.

use crate::domain::{Currency, Decimal, Nullable, Ticker};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time bond market data for one ticker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: Ticker,
    /// Trading session the values belong to.
    pub date: NaiveDate,
    #[serde(default)]
    pub short_name: Nullable<String>,
    #[serde(default)]
    pub maturity_date: Nullable<NaiveDate>,
    #[serde(default)]
    pub offer_date: Nullable<NaiveDate>,
    #[serde(default)]
    pub buyback_date: Nullable<NaiveDate>,
    /// Modified duration in days.
    #[serde(default)]
    pub duration: Nullable<Decimal>,
    #[serde(default)]
    pub yield_to_maturity: Nullable<Decimal>,
    #[serde(default)]
    pub yield_to_offer: Nullable<Decimal>,
    /// Accrued coupon interest per bond, in the settlement currency.
    #[serde(default)]
    pub accrued_interest: Nullable<Decimal>,
}

impl MarketSnapshot {
    pub fn new(ticker: Ticker, date: NaiveDate) -> Self {
        Self {
            ticker,
            date,
            ..Default::default()
        }
    }

    /// Offer yield when the bond has one, otherwise yield to maturity.
    pub fn preferred_yield(&self) -> Option<Decimal> {
        self.yield_to_offer
            .cloned_value()
            .or_else(|| self.yield_to_maturity.cloned_value())
    }

    /// The earlier of the offer and buyback dates, falling back to maturity.
    pub fn nearest_redemption_date(&self) -> Option<NaiveDate> {
        match (self.offer_date.value(), self.buyback_date.value()) {
            (Some(offer), Some(buyback)) => Some(*offer.min(buyback)),
            (Some(offer), None) => Some(*offer),
            (None, Some(buyback)) => Some(*buyback),
            (None, None) => self.maturity_date.cloned_value(),
        }
    }
}

/// Face value of one bond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominal {
    pub amount: Decimal,
    pub currency: Currency,
}

/// Static instrument attributes, looked up once per new lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMetadata {
    pub name: String,
    pub ticker: Ticker,
    pub class_code: String,
    pub nominal: Nominal,
    /// Nominal was redenominated by a corporate action and is quoted in a
    /// foreign currency while settling in the account currency.
    #[serde(default)]
    pub replaced: bool,
}

/// Official exchange rate of one currency unit on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    pub currency: Currency,
    pub date: NaiveDate,
    pub rate: Decimal,
}
