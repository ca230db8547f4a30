use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receipt time format: ISO-8601 UTC, second precision. UTC keeps keys unique
/// across daylight-saving changes, when local wall-clock seconds repeat.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Generates the store key for an entry received now.
pub type Clock = fn() -> String;

/// The value half of a stored entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryBody {
    pub username: String,
    pub message: String,
}

/// One stored message keyed by the listener's receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: String,
    pub body: EntryBody,
}

impl Entry {
    pub fn received(clock: Clock, username: String, message: String) -> Self {
        Self {
            timestamp: clock(),
            body: EntryBody { username, message },
        }
    }
}

pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
