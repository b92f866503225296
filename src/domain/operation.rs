//! Brokerage ledger events.

use crate::domain::{Currency, Decimal, Figi, InstrumentUid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operation type as coded by the brokerage feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum OperationKind {
    BondTax,
    Tax,
    BondRepaymentFull,
    DividendTax,
    BondRepayment,
    Buy,
    BuyCard,
    InputSecurities,
    BrokerFee,
    Dividend,
    Sell,
    Coupon,
    OutStampDuty,
    /// Administrative entries the ledger has no rule for.
    Unknown(i32),
}

/// What the ledger does with an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    Open,
    Close,
    Distribute(Accumulator),
    Ignored,
}

/// Lot field a proportional payment is booked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Coupon,
    Dividend,
    PartialEarlyRepayment,
    Commission,
    Tax,
}

impl OperationKind {
    pub fn code(&self) -> i32 {
        match self {
            OperationKind::BondTax => 2,
            OperationKind::Tax => 5,
            OperationKind::BondRepaymentFull => 6,
            OperationKind::DividendTax => 8,
            OperationKind::BondRepayment => 10,
            OperationKind::Buy => 15,
            OperationKind::BuyCard => 16,
            OperationKind::InputSecurities => 17,
            OperationKind::BrokerFee => 19,
            OperationKind::Dividend => 21,
            OperationKind::Sell => 22,
            OperationKind::Coupon => 23,
            OperationKind::OutStampDuty => 47,
            OperationKind::Unknown(code) => *code,
        }
    }

    pub fn category(&self) -> OperationCategory {
        match self {
            OperationKind::Buy | OperationKind::BuyCard | OperationKind::InputSecurities => {
                OperationCategory::Open
            }
            OperationKind::Sell | OperationKind::BondRepaymentFull => OperationCategory::Close,
            OperationKind::Coupon => OperationCategory::Distribute(Accumulator::Coupon),
            OperationKind::Dividend => OperationCategory::Distribute(Accumulator::Dividend),
            OperationKind::BondRepayment => {
                OperationCategory::Distribute(Accumulator::PartialEarlyRepayment)
            }
            OperationKind::OutStampDuty | OperationKind::BrokerFee => {
                OperationCategory::Distribute(Accumulator::Commission)
            }
            OperationKind::BondTax | OperationKind::Tax | OperationKind::DividendTax => {
                OperationCategory::Distribute(Accumulator::Tax)
            }
            OperationKind::Unknown(_) => OperationCategory::Ignored,
        }
    }
}

impl From<i32> for OperationKind {
    fn from(code: i32) -> Self {
        match code {
            2 => OperationKind::BondTax,
            5 => OperationKind::Tax,
            6 => OperationKind::BondRepaymentFull,
            8 => OperationKind::DividendTax,
            10 => OperationKind::BondRepayment,
            15 => OperationKind::Buy,
            16 => OperationKind::BuyCard,
            17 => OperationKind::InputSecurities,
            19 => OperationKind::BrokerFee,
            21 => OperationKind::Dividend,
            22 => OperationKind::Sell,
            23 => OperationKind::Coupon,
            47 => OperationKind::OutStampDuty,
            other => OperationKind::Unknown(other),
        }
    }
}

impl From<OperationKind> for i32 {
    fn from(kind: OperationKind) -> Self {
        kind.code()
    }
}

/// One ledger event as emitted by the brokerage feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub date: DateTime<Utc>,
    pub instrument_uid: InstrumentUid,
    pub figi: Figi,
    pub currency: Currency,
    pub quantity_done: Decimal,
    /// Price per bond in `currency`.
    pub price: Decimal,
    /// Signed cash amount: incoming positive, outgoing negative.
    pub payment: Decimal,
    pub commission: Decimal,
    pub accrued_interest: Decimal,
}

impl Operation {
    /// Bare operation of `kind`; amounts default to zero.
    pub fn new(kind: OperationKind, date: DateTime<Utc>, instrument_uid: InstrumentUid) -> Self {
        Self {
            kind,
            date,
            instrument_uid,
            figi: Figi::default(),
            currency: Currency::new("rub"),
            quantity_done: Decimal::zero(),
            price: Decimal::zero(),
            payment: Decimal::zero(),
            commission: Decimal::zero(),
            accrued_interest: Decimal::zero(),
        }
    }

    pub fn with_figi(mut self, figi: Figi) -> Self {
        self.figi = figi;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity_done = quantity;
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_payment(mut self, payment: Decimal) -> Self {
        self.payment = payment;
        self
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_accrued_interest(mut self, accrued_interest: Decimal) -> Self {
        self.accrued_interest = accrued_interest;
        self
    }
}
