//! Store configuration parsed from environment variables.

use crate::error::ConfigError;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const AREA_VAR: &str = "KEYSYNC_STORAGE_AREA";
pub const TRACE_EVENTS_VAR: &str = "KEYSYNC_TRACE_EVENTS";
pub const QUOTA_BYTES_VAR: &str = "KEYSYNC_QUOTA_BYTES";

/// Which browser storage area a gateway is backed by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageArea {
    /// `window.localStorage`: shared by every tab of the origin, survives restarts.
    #[default]
    Local,
    /// `window.sessionStorage`: scoped to one tab.
    Session,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub area: StorageArea,
    /// Log every dispatched storage event at `debug`.
    pub trace_events: bool,
    /// Byte quota enforced by the in-memory backend. `None` is unbounded.
    pub quota_bytes: Option<usize>,
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Optional:
    /// - `KEYSYNC_STORAGE_AREA`: `local` (default) or `session`
    /// - `KEYSYNC_TRACE_EVENTS`: `1`/`true` to log each event, default off
    /// - `KEYSYNC_QUOTA_BYTES`: byte quota for in-memory stores, default none
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unrecognized value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let area = parse_area(lookup(AREA_VAR).as_deref())?;
        let trace_events = parse_flag(TRACE_EVENTS_VAR, lookup(TRACE_EVENTS_VAR).as_deref())?;
        let quota_bytes = match lookup(QUOTA_BYTES_VAR) {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue { var: QUOTA_BYTES_VAR, value: raw.clone() })?,
            ),
        };

        Ok(Self { area, trace_events, quota_bytes })
    }
}

fn parse_area(raw: Option<&str>) -> Result<StorageArea, ConfigError> {
    match raw.map(str::trim).unwrap_or("local") {
        "local" => Ok(StorageArea::Local),
        "session" => Ok(StorageArea::Session),
        other => Err(ConfigError::UnknownArea(other.to_string())),
    }
}

fn parse_flag(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None | Some("" | "0" | "false") => Ok(false),
        Some("1" | "true") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue { var, value: other.to_string() }),
    }
}

