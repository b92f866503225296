//! Domain primitives: identifiers and codes that flow through the ledger.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Brokerage account identifier.
    AccountId
);

string_id!(
    /// Broker-side unique instrument identifier (stable across renames).
    InstrumentUid
);

string_id!(
    /// FIGI code of the instrument.
    Figi
);

string_id!(
    /// Exchange ticker (e.g., "RU000A105TP8" for an OFZ issue on MOEX).
    Ticker
);

/// ISO currency code, always kept lowercase ("rub", "usd", "cny").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Currency(code.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_is_normalized() {
        assert_eq!(Currency::new(" USD "), Currency::new("usd"));
        assert_eq!(Currency::new("CNY").as_str(), "cny");
    }

    #[test]
    fn test_ticker_display() {
        let ticker = Ticker::new("SU26238RMFS4");
        assert_eq!(ticker.to_string(), "SU26238RMFS4");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&InstrumentUid::new("uid-1")).unwrap();
        assert_eq!(json, "\"uid-1\"");
    }
}
