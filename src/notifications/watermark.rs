//! Per-category "last seen" watermarks, persisted on the local device.
//!
//! The whole set lives under a single key as a JSON object mapping category
//! names to RFC 3339 instants. A missing, unreadable or corrupted blob is read
//! as "nothing seen yet": every category falls back to the Unix epoch and all
//! records count as new. Storage errors are logged and swallowed.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::CategoryId;
use crate::local_store::LocalStateStore;
use crate::metrics;

/// Well-known key under which the watermark set is stored.
pub const WATERMARKS_KEY: &str = "notifications.last_seen";

pub type WatermarkSet = BTreeMap<CategoryId, DateTime<Utc>>;

pub struct WatermarkStore {
    backend: Arc<dyn LocalStateStore>,
}

impl WatermarkStore {
    pub fn new(backend: Arc<dyn LocalStateStore>) -> Self {
        Self { backend }
    }

    /// Returns the last-seen instant for `category`, or the epoch if never set.
    pub fn get_watermark(&self, category: CategoryId) -> DateTime<Utc> {
        self.snapshot()
            .get(&category)
            .copied()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Reads every stored watermark at once. Categories never seen are absent.
    pub fn snapshot(&self) -> WatermarkSet {
        let raw = match self.backend.get_state(WATERMARKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return WatermarkSet::new(),
            Err(e) => {
                warn!("Failed to read notification watermarks: {}", e);
                return WatermarkSet::new();
            }
        };
        decode(&raw)
    }

    /// Marks every tracked category as seen up to `now`, in a single write.
    pub fn advance_all(&self, now: DateTime<Utc>) {
        let mut set = self.snapshot();
        for category in CategoryId::ALL {
            raise(&mut set, category, now);
        }
        self.persist(&set);
    }

    /// Marks a single category as seen up to `now`.
    pub fn advance_one(&self, category: CategoryId, now: DateTime<Utc>) {
        let mut set = self.snapshot();
        raise(&mut set, category, now);
        self.persist(&set);
    }

    /// Forgets every watermark, so all records count as new again.
    pub fn clear(&self) {
        if let Err(e) = self.backend.delete_state(WATERMARKS_KEY) {
            warn!("Failed to clear notification watermarks: {}", e);
            metrics::record_watermark_write_failure();
        }
    }

    fn persist(&self, set: &WatermarkSet) {
        let encoded: BTreeMap<&str, String> = set
            .iter()
            .map(|(category, at)| (category.as_str(), at.to_rfc3339()))
            .collect();
        let result = serde_json::to_string(&encoded)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.backend.set_state(WATERMARKS_KEY, &json));
        if let Err(e) = result {
            warn!("Failed to persist notification watermarks: {}", e);
            metrics::record_watermark_write_failure();
        }
    }
}

/// Stored watermarks never move backwards, even if the clock does.
fn raise(set: &mut WatermarkSet, category: CategoryId, now: DateTime<Utc>) {
    let slot = set.entry(category).or_insert(now);
    if *slot < now {
        *slot = now;
    } else if *slot > now {
        debug!(
            "Keeping {} watermark at {}, later than requested {}",
            category, slot, now
        );
    }
}

fn decode(raw: &str) -> WatermarkSet {
    let entries: BTreeMap<String, String> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding corrupted notification watermarks: {}", e);
            return WatermarkSet::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(name, at)| {
            let category = CategoryId::parse(&name)?;
            match DateTime::parse_from_rfc3339(&at) {
                Ok(at) => Some((category, at.with_timezone(&Utc))),
                Err(e) => {
                    debug!("Ignoring unparseable watermark for {}: {}", name, e);
                    None
                }
            }
        })
        .collect()
}
