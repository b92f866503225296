//! Pure computation engine for the FIFO tax-lot ledger and its reports.

use crate::domain::{Decimal, InstrumentMetadata, InstrumentUid, OperationKind};
use chrono::NaiveDate;
use thiserror::Error;

pub mod book;
pub mod cohort;
pub mod ledger;
pub mod policy;
pub mod report;

pub use book::Book;
pub use cohort::{aggregate, group_by_ticker, portfolio_value, GeneralBondReportPosition};
pub use ledger::Ledger;
pub use policy::{BuyPriceOverrides, TaxPolicy};
pub use report::{build_report, profit, BondReport, Profit};

/// Externally resolved data an operation may need.
///
/// Only opening operations read it; the caller fetches it beforehand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub metadata: Option<InstrumentMetadata>,
    /// Last trade price in percent of nominal.
    pub last_price: Option<Decimal>,
    /// Rate converting the nominal currency into the settlement currency.
    pub fx_rate: Option<Decimal>,
}

impl ReferenceData {
    pub fn new(metadata: InstrumentMetadata, last_price: Decimal) -> Self {
        Self {
            metadata: Some(metadata),
            last_price: Some(last_price),
            fx_rate: None,
        }
    }

    pub fn with_fx_rate(mut self, rate: Decimal) -> Self {
        self.fx_rate = Some(rate);
        self
    }
}

/// Outcome of applying one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Opened,
    Distributed,
    /// Number of realized slices the sell produced.
    Closed { realized: usize },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("division by zero: {context}")]
    DivisionByZero { context: &'static str },
    #[error("cannot close {requested} of {instrument}: only {open} open")]
    Oversell {
        instrument: InstrumentUid,
        requested: Decimal,
        open: Decimal,
    },
    #[error("{kind:?} operation for {instrument} has non-positive quantity {quantity}")]
    NonPositiveQuantity {
        kind: OperationKind,
        instrument: InstrumentUid,
        quantity: Decimal,
    },
    #[error("cohort has no lots")]
    EmptyCohort,
    #[error("missing {what} for {subject} (date: {date:?})")]
    MissingReferenceData {
        what: &'static str,
        subject: String,
        date: Option<NaiveDate>,
    },
}

impl EngineError {
    pub fn missing(what: &'static str, subject: impl Into<String>, date: Option<NaiveDate>) -> Self {
        EngineError::MissingReferenceData {
            what,
            subject: subject.into(),
            date,
        }
    }

    /// Arithmetic or bookkeeping invariant broken, as opposed to absent data.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, EngineError::MissingReferenceData { .. })
    }
}
