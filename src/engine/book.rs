use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{AccountId, Decimal, InstrumentUid, Lot, Operation, OperationCategory};

use super::{Applied, BuyPriceOverrides, EngineError, Ledger, ReferenceData};

/// All ledgers of one account, keyed by instrument.
#[derive(Debug, Clone)]
pub struct Book {
    account_id: AccountId,
    overrides: Arc<BuyPriceOverrides>,
    ledgers: BTreeMap<InstrumentUid, Ledger>,
}

impl Book {
    pub fn new(account_id: AccountId) -> Self {
        Self::with_overrides(account_id, BuyPriceOverrides::default())
    }

    pub fn with_overrides(account_id: AccountId, overrides: BuyPriceOverrides) -> Self {
        Self {
            account_id,
            overrides: Arc::new(overrides),
            ledgers: BTreeMap::new(),
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Route `operation` to the ledger of its instrument.
    ///
    /// A ledger is created by its first opening operation. Anything else
    /// aimed at an unknown instrument fails the way an empty ledger would,
    /// without registering the instrument.
    pub fn apply(
        &mut self,
        operation: &Operation,
        reference: &ReferenceData,
    ) -> Result<Applied, EngineError> {
        let category = operation.kind.category();
        if category == OperationCategory::Ignored {
            tracing::debug!(
                account = %self.account_id,
                code = operation.kind.code(),
                "Skipping operation without ledger rule"
            );
            return Ok(Applied::Skipped);
        }

        let uid = &operation.instrument_uid;
        if let Some(ledger) = self.ledgers.get_mut(uid) {
            return ledger.apply(operation, reference);
        }

        let mut ledger = Ledger::with_overrides(uid.clone(), Arc::clone(&self.overrides));
        let applied = ledger.apply(operation, reference)?;
        self.ledgers.insert(uid.clone(), ledger);
        Ok(applied)
    }

    pub fn ledger(&self, uid: &InstrumentUid) -> Option<&Ledger> {
        self.ledgers.get(uid)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = &Ledger> {
        self.ledgers.values()
    }

    pub fn open_lots(&self) -> impl Iterator<Item = &Lot> {
        self.ledgers.values().flat_map(|ledger| ledger.lots().iter())
    }

    pub fn closed_lots(&self) -> impl Iterator<Item = &Lot> {
        self.ledgers.values().flat_map(|ledger| ledger.closed().iter())
    }

    /// See [`Ledger::mark_to_market`]. Unknown instruments are ignored.
    pub fn mark_to_market(
        &mut self,
        uid: &InstrumentUid,
        price_percent: Decimal,
        accrued_interest: Option<Decimal>,
    ) {
        if let Some(ledger) = self.ledgers.get_mut(uid) {
            ledger.mark_to_market(price_percent, accrued_interest);
        }
    }
}
