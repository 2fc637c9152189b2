//! Inclusive time range for history queries.

use serde::{Deserialize, Serialize};

use crate::domain::shared::Timestamp;

/// Inclusive `[start, end]` bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRange {
    /// Earliest timestamp included.
    pub start: Option<Timestamp>,
    /// Latest timestamp included.
    pub end: Option<Timestamp>,
}

impl HistoryRange {
    /// Unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Both bounds set.
    #[must_use]
    pub const fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Everything at or after `start`.
    #[must_use]
    pub const fn since(start: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Returns true if `ts` falls within the range.
    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}
