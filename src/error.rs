//! Error types shared by the gateway, the binding and the backends.
//!
//! ERROR HANDLING
//! ==============
//! Only the explicit-result surfaces (`StorageGateway::write`,
//! `StorageGateway::remove`, `KeyBinding::try_set_value`) hand these to the
//! caller. Everything observer-facing logs them and degrades to a default.

use std::fmt;

/// Which store operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Remove,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Remove => "remove",
        })
    }
}

/// Error returned by storage backends and the binding's serialization boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage is disabled or not present in this environment.
    #[error("storage is unavailable")]
    Unavailable,
    /// The write would exceed the store's byte quota.
    #[error("storage quota exceeded writing key {key:?}")]
    QuotaExceeded { key: String },
    /// Any other platform fault.
    #[error("storage {op} failed for key {key:?}: {message}")]
    Access { op: StoreOp, key: String, message: String },
    /// The logical value could not be turned into its stored form.
    #[error("failed to serialize value for key {key:?}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The stored form could not be parsed into the caller's logical type.
    #[error("failed to deserialize value for key {key:?}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error returned by [`crate::config::StoreConfig::from_env`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage area {0:?}, expected \"local\" or \"session\"")]
    UnknownArea(String),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}
