//! One poll cycle: read watermarks, fetch every category concurrently, count.
//!
//! Every fetcher is awaited until it settles. A fetch that fails or runs past
//! its deadline contributes an empty collection, so it never affects the
//! counts of the other categories. Polling never writes watermarks.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::delta;
use super::fetcher::{FetchError, SourceFetcher};
use super::models::{AggregateNotificationState, CategoryId, DeltaCount, PanelEntry, SourceRecord};
use super::watermark::WatermarkStore;
use crate::metrics;

pub struct Aggregator {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    watermarks: Arc<WatermarkStore>,
    fetch_timeout: Duration,
    panel_max_items: usize,
}

impl Aggregator {
    pub fn new(
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        watermarks: Arc<WatermarkStore>,
        fetch_timeout: Duration,
        panel_max_items: usize,
    ) -> Self {
        Self {
            fetchers,
            watermarks,
            fetch_timeout,
            panel_max_items,
        }
    }

    /// Categories this aggregator reports on, in display order.
    pub fn categories(&self) -> Vec<CategoryId> {
        let mut categories: Vec<CategoryId> = self.fetchers.iter().map(|f| f.category()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub async fn poll(&self) -> AggregateNotificationState {
        let watermarks = self.watermarks.snapshot();

        let settled = join_all(self.fetchers.iter().map(|f| self.settle(f.as_ref()))).await;

        let mut by_category: BTreeMap<CategoryId, Vec<SourceRecord>> = BTreeMap::new();
        for (category, records) in settled {
            by_category.entry(category).or_default().extend(records);
        }

        let mut state = AggregateNotificationState::default();
        for (category, records) in &by_category {
            let watermark = watermarks
                .get(category)
                .copied()
                .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);

            let new = delta::new_records(records, watermark);
            state.counts.push(DeltaCount {
                category: *category,
                count: new.len(),
            });
            state.entries.extend(new.into_iter().map(|r| PanelEntry {
                category: *category,
                id: r.id().to_string(),
                title: r.title().map(str::to_string),
                at: r.last_activity(),
            }));
        }

        state.total = state.counts.iter().map(|c| c.count).sum();
        // Newest first; ties broken by category and id so repeated polls render identically.
        state.entries.sort_by(|a, b| {
            b.at.cmp(&a.at)
                .then(a.category.cmp(&b.category))
                .then(a.id.cmp(&b.id))
        });
        state.entries.truncate(self.panel_max_items);

        metrics::record_poll(&state);
        debug!("Poll finished with {} new notifications", state.total);
        state
    }

    async fn settle(&self, fetcher: &dyn SourceFetcher) -> (CategoryId, Vec<SourceRecord>) {
        let category = fetcher.category();
        let started = Instant::now();

        let result = match tokio::time::timeout(self.fetch_timeout, fetcher.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        match result {
            Ok(records) => {
                metrics::record_fetch(category, started.elapsed(), None);
                (category, records)
            }
            Err(e) => {
                warn!("Fetching {} failed, counting it as empty: {}", category, e);
                metrics::record_fetch(category, started.elapsed(), Some(e.kind()));
                (category, Vec::new())
            }
        }
    }
}
