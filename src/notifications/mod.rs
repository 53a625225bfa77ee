//! Notification watermark aggregator
//!
//! Polls every notification category of the school backend, counts what is
//! new since the user last looked, and drives the bell badge and panel.

mod aggregator;
mod bell;
mod delta;
mod fetcher;
mod models;
mod poller;
mod watermark;

pub use aggregator::Aggregator;
pub use bell::{NotificationBell, PanelState};
pub use delta::{count_new, new_records};
#[cfg(feature = "mock")]
pub use fetcher::MockSourceFetcher;
pub use fetcher::{BackendClient, FetchError, HttpSourceFetcher, SourceFetcher};
pub use models::{
    AggregateNotificationState, CategoryId, DeltaCount, MessageRecord, PanelEntry, ReadState,
    SourceRecord, TimestampedRecord,
};
pub use poller::{create_poller, NotificationPoller, PollerCommand, PollerHandle};
pub use watermark::{WatermarkSet, WatermarkStore, WATERMARKS_KEY};
