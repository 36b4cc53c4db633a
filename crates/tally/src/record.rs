//! The persisted total record.
//!
//! A single row holds the accumulated counter value and the time it was last
//! written. Only [`TOTAL_ID`] is ever stored.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Fixed identifier of the one and only total record.
pub const TOTAL_ID: i64 = 1;

/// Marker meaning "no update has ever occurred".
pub const NEVER: &str = "Never";

/// Format used for textual timestamps, e.g. `Fri Oct 16 14:03:12 +02:00 2026`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

/// The accumulated total and when it was last persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRecord {
    /// Record identifier (always [`TOTAL_ID`] in practice).
    pub id: i64,

    /// The counter value.
    pub value: u32,

    /// Textual timestamp of the last write, or [`NEVER`].
    pub last_updated: String,
}

impl TotalRecord {
    /// Create the total record with the given value and timestamp.
    #[must_use]
    pub fn new(value: u32, last_updated: impl Into<String>) -> Self {
        Self {
            id: TOTAL_ID,
            value,
            last_updated: last_updated.into(),
        }
    }

    /// The record written on first launch: zero, stamped with the current time.
    #[must_use]
    pub fn initial() -> Self {
        Self::new(0, timestamp_now())
    }

    /// Whether this record has ever been stamped with a real time.
    #[must_use]
    pub fn has_been_updated(&self) -> bool {
        is_real_timestamp(&self.last_updated)
    }
}

/// The current local time rendered with [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `false` for the empty string and the [`NEVER`] sentinel.
#[must_use]
pub fn is_real_timestamp(value: &str) -> bool {
    !value.is_empty() && value != NEVER
}
