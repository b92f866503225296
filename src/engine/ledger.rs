use std::sync::Arc;

use crate::domain::{
    Accumulator, Decimal, InstrumentUid, Lot, Operation, OperationCategory, OperationKind,
};

use super::{Applied, BuyPriceOverrides, EngineError, ReferenceData};

/// FIFO lots of one instrument within one account.
///
/// `lots[0]` is the oldest purchase and is consumed first by sells.
/// `total_quantity` always equals the sum of the open lot quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    instrument_uid: InstrumentUid,
    total_quantity: Decimal,
    lots: Vec<Lot>,
    closed: Vec<Lot>,
    overrides: Arc<BuyPriceOverrides>,
}

impl Ledger {
    pub fn new(instrument_uid: InstrumentUid) -> Self {
        Self::with_overrides(instrument_uid, Arc::new(BuyPriceOverrides::default()))
    }

    pub fn with_overrides(instrument_uid: InstrumentUid, overrides: Arc<BuyPriceOverrides>) -> Self {
        Self {
            instrument_uid,
            total_quantity: Decimal::zero(),
            lots: Vec::new(),
            closed: Vec::new(),
            overrides,
        }
    }

    pub fn instrument_uid(&self) -> &InstrumentUid {
        &self.instrument_uid
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    /// Open lots in FIFO order.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Realized slices in the order they were closed.
    pub fn closed(&self) -> &[Lot] {
        &self.closed
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Apply one operation.
    ///
    /// On error the ledger is unchanged, so the caller may fix the input and
    /// retry the same operation.
    pub fn apply(
        &mut self,
        operation: &Operation,
        reference: &ReferenceData,
    ) -> Result<Applied, EngineError> {
        match operation.kind.category() {
            OperationCategory::Open => {
                self.open(operation, reference)?;
                Ok(Applied::Opened)
            }
            OperationCategory::Distribute(accumulator) => {
                self.distribute(operation, accumulator)?;
                Ok(Applied::Distributed)
            }
            OperationCategory::Close => {
                let realized = self.close(operation)?;
                Ok(Applied::Closed { realized })
            }
            OperationCategory::Ignored => Ok(Applied::Skipped),
        }
    }

    /// Refresh the valuation of open lots.
    ///
    /// `price_percent` is the last price in percent of nominal;
    /// `accrued_interest` is per bond, when known.
    pub fn mark_to_market(&mut self, price_percent: Decimal, accrued_interest: Option<Decimal>) {
        for lot in &mut self.lots {
            lot.sell_price = lot.nominal * price_percent / Decimal::hundred();
            if let Some(aci) = accrued_interest {
                lot.sell_accrued_interest = aci * lot.quantity;
            }
        }
    }

    fn open(&mut self, operation: &Operation, reference: &ReferenceData) -> Result<(), EngineError> {
        self.ensure_positive_quantity(operation)?;

        let date = Some(operation.date.date_naive());
        let metadata = reference.metadata.as_ref().ok_or_else(|| {
            EngineError::missing("instrument metadata", operation.instrument_uid.as_str(), date)
        })?;
        let last_price = reference.last_price.ok_or_else(|| {
            EngineError::missing("last price", metadata.ticker.as_str(), date)
        })?;

        let (nominal, currency) = if metadata.replaced {
            let rate = reference.fx_rate.ok_or_else(|| {
                EngineError::missing("fx rate", metadata.nominal.currency.as_str(), date)
            })?;
            (metadata.nominal.amount * rate, operation.currency.clone())
        } else {
            (metadata.nominal.amount, metadata.nominal.currency.clone())
        };

        let buy_price = match operation.kind {
            OperationKind::InputSecurities => self
                .overrides
                .lookup(&operation.figi, &operation.instrument_uid)
                .unwrap_or(operation.price),
            _ => operation.price,
        };

        self.lots.push(Lot {
            instrument_uid: operation.instrument_uid.clone(),
            figi: operation.figi.clone(),
            name: metadata.name.clone(),
            ticker: metadata.ticker.clone(),
            class_code: metadata.class_code.clone(),
            currency,
            replaced: metadata.replaced,
            buy_date: operation.date,
            sell_date: None,
            quantity: operation.quantity_done,
            buy_price,
            sell_price: nominal * last_price / Decimal::hundred(),
            nominal,
            buy_accrued_interest: operation.accrued_interest,
            sell_accrued_interest: Decimal::zero(),
            total_coupon: Decimal::zero(),
            total_dividend: Decimal::zero(),
            total_commission: operation.commission,
            partial_early_repayment: Decimal::zero(),
            paid_tax: Decimal::zero(),
        });
        self.total_quantity += operation.quantity_done;
        Ok(())
    }

    /// Spread a payment across open lots in proportion to their quantity.
    fn distribute(&mut self, operation: &Operation, accumulator: Accumulator) -> Result<(), EngineError> {
        if self.total_quantity.is_zero() {
            return Err(EngineError::DivisionByZero {
                context: "payment distributed over a ledger with no open quantity",
            });
        }

        let total = self.total_quantity;
        for lot in &mut self.lots {
            let share = operation.payment * (lot.quantity / total);
            let target = match accumulator {
                Accumulator::Coupon => &mut lot.total_coupon,
                Accumulator::Dividend => &mut lot.total_dividend,
                Accumulator::PartialEarlyRepayment => &mut lot.partial_early_repayment,
                Accumulator::Commission => &mut lot.total_commission,
                Accumulator::Tax => &mut lot.paid_tax,
            };
            *target += share;
        }
        Ok(())
    }

    /// Consume lots from the head until the sold quantity is covered.
    fn close(&mut self, operation: &Operation) -> Result<usize, EngineError> {
        self.ensure_positive_quantity(operation)?;
        if operation.quantity_done > self.total_quantity {
            return Err(EngineError::Oversell {
                instrument: self.instrument_uid.clone(),
                requested: operation.quantity_done,
                open: self.total_quantity,
            });
        }

        self.total_quantity -= operation.quantity_done;

        let exit_price = exit_price(operation);
        let mut remaining = operation.quantity_done;
        let mut accrued = operation.accrued_interest;
        let mut commission = operation.commission;
        let mut consumed = 0;
        let mut realized = Vec::new();

        for lot in &mut self.lots {
            if lot.quantity > remaining {
                let proportion = remaining / lot.quantity;
                let mut slice = realized_slice(lot, remaining, operation, exit_price);
                slice.total_coupon = Decimal::zero();
                slice.total_dividend = Decimal::zero();
                slice.partial_early_repayment = Decimal::zero();
                slice.scale_cost_basis(proportion);
                slice.total_commission += commission;
                slice.sell_accrued_interest = accrued;
                realized.push(slice);

                lot.scale_cost_basis(Decimal::one() - proportion);
                lot.quantity -= remaining;
                break;
            } else if lot.quantity == remaining {
                let mut slice = realized_slice(lot, remaining, operation, exit_price);
                slice.total_commission += commission;
                slice.sell_accrued_interest = accrued;
                realized.push(slice);

                consumed += 1;
                break;
            } else {
                let proportion = lot.quantity / remaining;
                let mut slice = realized_slice(lot, lot.quantity, operation, exit_price);
                slice.total_commission += commission * proportion;
                slice.sell_accrued_interest = accrued * proportion;
                realized.push(slice);

                let left = Decimal::one() - proportion;
                accrued *= left;
                commission *= left;
                remaining -= lot.quantity;
                consumed += 1;
            }
        }

        // Fully consumed lots always form a prefix.
        self.lots.drain(..consumed);
        let count = realized.len();
        self.closed.extend(realized);
        Ok(count)
    }

    fn ensure_positive_quantity(&self, operation: &Operation) -> Result<(), EngineError> {
        if operation.quantity_done.is_positive() {
            Ok(())
        } else {
            Err(EngineError::NonPositiveQuantity {
                kind: operation.kind,
                instrument: operation.instrument_uid.clone(),
                quantity: operation.quantity_done,
            })
        }
    }
}

/// Full redemptions come with a payment but no price.
fn exit_price(operation: &Operation) -> Decimal {
    if operation.price.is_zero() {
        operation
            .payment
            .abs()
            .checked_div(operation.quantity_done)
            .unwrap_or_default()
    } else {
        operation.price
    }
}

fn realized_slice(lot: &Lot, quantity: Decimal, operation: &Operation, exit_price: Decimal) -> Lot {
    Lot {
        quantity,
        sell_date: Some(operation.date),
        sell_price: exit_price,
        ..lot.clone()
    }
}
