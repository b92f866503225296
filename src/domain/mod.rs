//! Domain types for the bond tax-lot ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Identifier primitives: AccountId, InstrumentUid, Figi, Ticker, Currency
//! - Brokerage operations and their ledger categories
//! - Tax lots and reference-data snapshots with tri-state nullable fields

pub mod decimal;
pub mod lot;
pub mod market;
pub mod nullable;
pub mod operation;
pub mod primitives;

pub use decimal::Decimal;
pub use lot::Lot;
pub use market::{FxRate, InstrumentMetadata, MarketSnapshot, Nominal};
pub use nullable::Nullable;
pub use operation::{Accumulator, Operation, OperationCategory, OperationKind};
pub use primitives::{AccountId, Currency, Figi, InstrumentUid, Ticker};
