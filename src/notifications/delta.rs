//! Decides which records of a category are "new".
//!
//! Two rules, never combined for the same collection:
//! 1. When the collection carries a server-side read flag (messages), a record
//!    is new while it is not marked read. The watermark is ignored.
//! 2. Otherwise a record is new when its last activity is strictly after the
//!    category's watermark.

use chrono::{DateTime, Utc};

use super::models::{CategoryId, DeltaCount, ReadState, SourceRecord};

/// Returns the records of one category that count as new against `watermark`.
pub fn new_records<'a>(
    records: &'a [SourceRecord],
    watermark: DateTime<Utc>,
) -> Vec<&'a SourceRecord> {
    let flag_tracked = records
        .iter()
        .any(|r| r.read_state() != ReadState::NotTracked);

    if flag_tracked {
        records
            .iter()
            .filter(|r| r.read_state() != ReadState::Read)
            .collect()
    } else {
        records
            .iter()
            .filter(|r| r.last_activity().is_some_and(|at| at > watermark))
            .collect()
    }
}

pub fn count_new(
    category: CategoryId,
    records: &[SourceRecord],
    watermark: DateTime<Utc>,
) -> DeltaCount {
    DeltaCount {
        category,
        count: new_records(records, watermark).len(),
    }
}
