//! Tunable rules: the capital-gains tax and known buy-price corrections.

use crate::domain::{Decimal, Figi, InstrumentUid};
use std::collections::HashMap;

/// Capital-gains tax with a long-term holding exemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPolicy {
    pub rate: Decimal,
    /// Holding period, in hours, from which gains are tax-free.
    pub exemption_hours: i64,
}

impl TaxPolicy {
    /// 13% personal income tax, exempt after three years (3 × 8768 h).
    pub fn russian_resident() -> Self {
        Self {
            rate: Decimal::new(rust_decimal::Decimal::new(13, 2)),
            exemption_hours: 26_304,
        }
    }

    pub fn tax_for(&self, profit_before_tax: Decimal, holding_hours: i64) -> Decimal {
        if profit_before_tax.is_positive() && holding_hours < self.exemption_hours {
            profit_before_tax * self.rate
        } else {
            Decimal::zero()
        }
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::russian_resident()
    }
}

/// Fixed buy prices for instruments whose transfer-in records carry no usable
/// price (the depository that sent them does not report acquisition cost).
///
/// Keys are FIGI codes or instrument uids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyPriceOverrides {
    prices: HashMap<String, Decimal>,
}

impl BuyPriceOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(id.into(), price);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// FIGI takes precedence over the instrument uid.
    pub fn lookup(&self, figi: &Figi, uid: &InstrumentUid) -> Option<Decimal> {
        self.prices
            .get(figi.as_str())
            .or_else(|| self.prices.get(uid.as_str()))
            .copied()
    }

    /// Parse `id=price,id=price`. Blank entries are ignored.
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut overrides = Self::new();
        for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (id, price) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected id=price, got {}", entry))?;
            let price = Decimal::from_str_canonical(price)
                .map_err(|e| format!("invalid price for {}: {}", id.trim(), e))?;
            overrides.prices.insert(id.trim().to_string(), price);
        }
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_tax_boundary() {
        let policy = TaxPolicy::default();
        assert_eq!(policy.tax_for(d("100"), 26_303), d("13"));
        assert_eq!(policy.tax_for(d("100"), 26_304), Decimal::zero());
        assert_eq!(policy.tax_for(d("-100"), 10), Decimal::zero());
        assert_eq!(policy.tax_for(Decimal::zero(), 10), Decimal::zero());
    }

    #[test]
    fn test_overrides_parse_and_lookup() {
        let overrides = BuyPriceOverrides::parse("BBG00ABC=1012.5, uid-7=990").unwrap();
        assert_eq!(
            overrides.lookup(&Figi::new("BBG00ABC"), &InstrumentUid::new("x")),
            Some(d("1012.5"))
        );
        assert_eq!(
            overrides.lookup(&Figi::new("none"), &InstrumentUid::new("uid-7")),
            Some(d("990"))
        );
        assert_eq!(
            overrides.lookup(&Figi::new("none"), &InstrumentUid::new("none")),
            None
        );
    }

    #[test]
    fn test_overrides_parse_rejects_garbage() {
        assert!(BuyPriceOverrides::parse("BBG00ABC").is_err());
        assert!(BuyPriceOverrides::parse("BBG00ABC=abc").is_err());
        assert!(BuyPriceOverrides::parse(" , ").unwrap().is_empty());
    }
}
