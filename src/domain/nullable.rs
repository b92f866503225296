//! Tri-state value for reference-data fields.
//!
//! Exchange responses distinguish "the column was not requested" from "the
//! column came back null". Both are common for bonds without an offer or a
//! buyback schedule, and reports treat them alike, but the ingestion side
//! needs to tell them apart.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that may be absent, explicitly null, or present.
///
/// Use `#[serde(default)]` on the containing field so that a missing key
/// deserializes to [`Nullable::Unset`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Nullable<T> {
    /// The field was not part of the response.
    #[default]
    Unset,
    /// The field was present and explicitly null.
    Null,
    /// The field carries a value.
    Value(T),
}

impl<T> Nullable<T> {
    pub fn is_set(&self) -> bool {
        !matches!(self, Nullable::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    /// True only for a present, non-null value.
    pub fn has_value(&self) -> bool {
        matches!(self, Nullable::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Nullable::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Nullable::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Clone> Nullable<T> {
    pub fn cloned_value(&self) -> Option<T> {
        self.value().cloned()
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Nullable::Value(v),
            None => Nullable::Null,
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nullable::Value(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the key exists; a missing key goes through Default.
        Option::<T>::deserialize(deserializer).map(Nullable::from)
    }
}
