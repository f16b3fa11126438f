//! Serialization boundary between raw slot strings and logical values.
//!
//! Raw values are JSON. An absent or empty slot parses as the `null` literal,
//! so "absent", "empty" and "stored null" all read as no value. [`Slot`]
//! keeps the difference between absent and corrupt for callers that need
//! it; [`derive`] collapses both to `None`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

#[cfg(test)]
#[path = "slot_test.rs"]
mod slot_test;

/// Tagged read of one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<T> {
    /// Nothing stored, an empty string, or the `null` literal.
    Absent,
    /// Stored text does not parse as the expected type.
    Corrupt,
    Present(T),
}

impl<T> Slot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt)
    }

    /// Collapse to the logical value: absent and corrupt both become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent | Self::Corrupt => None,
        }
    }
}

impl<T: DeserializeOwned> Slot<T> {
    pub fn from_raw(key: &str, raw: Option<&str>) -> Self {
        match parse(key, raw) {
            Ok(Some(v)) => Self::Present(v),
            Ok(None) => Self::Absent,
            Err(_) => Self::Corrupt,
        }
    }
}

/// Parse a raw slot value into `T`, treating absence and `""` as `null`.
///
/// # Errors
///
/// Returns [`StoreError::Deserialize`] when `raw` is not valid JSON for `T`.
pub fn parse<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Result<Option<T>, StoreError> {
    serde_json::from_str::<Option<T>>(raw.filter(|raw| !raw.is_empty()).unwrap_or("null"))
        .map_err(|source| StoreError::Deserialize { key: key.to_string(), source })
}

/// Serialize a logical value into its stored form.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] when `value` has no JSON form (for
/// example a map with non-string keys).
pub fn serialize<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialize { key: key.to_string(), source })
}

/// Logical value for a raw slot value. Parse faults are logged and read as `None`.
pub fn derive<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Option<T> {
    match parse(key, raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("discarding unreadable stored value: key={key} error={e}");
            None
        }
    }
}
