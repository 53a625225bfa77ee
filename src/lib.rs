//! Global-T Notification Bell Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod cli_style;
pub mod config;
pub mod local_store;
pub mod metrics;
pub mod notifications;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use local_store::{LocalStateStore, MemoryLocalStore, SqliteLocalStore};
pub use notifications::{
    AggregateNotificationState, Aggregator, BackendClient, CategoryId, NotificationBell,
    WatermarkStore,
};
