//! Wall clock timestamps.
//!
//! The only use of the wall clock in request handling is deriving default
//! output names. Callers capture one `Timestamp` per request and pass it
//! down, so every time-derived value in a request agrees.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// UTC instant, serialized as RFC 3339
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Get current timestamp
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing instant
    #[must_use]
    pub const fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Parse an RFC 3339 string such as `2024-05-01T12:30:00Z`
    ///
    /// # Errors
    ///
    /// Returns error if the string is not valid RFC 3339
    pub fn parse_rfc3339(raw: &str) -> CoreResult<Self> {
        DateTime::parse_from_rfc3339(raw)
            .map(|at| Self(at.with_timezone(&Utc)))
            .map_err(|e| CoreError::InvalidTimestamp {
                reason: format!("{}: {}", raw, e),
            })
    }

    /// Compact stamp used in generated file names, e.g. `20240501_123000`
    #[must_use]
    pub fn name_stamp(&self) -> String {
        self.0.format("%Y%m%d_%H%M%S").to_string()
    }

    /// Output name with a prefix, e.g. `rigged_20240501_123000`
    #[must_use]
    pub fn output_name(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.name_stamp())
    }

    /// RFC 3339 rendering with second precision
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Get the inner instant
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
