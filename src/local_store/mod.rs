//! Durable, device-local key/value state.
//!
//! Nothing stored here is synced with the backend: it lives only on the
//! machine running the client and survives restarts.

mod memory_local_store;
mod schema;
mod sqlite_local_store;

pub use memory_local_store::MemoryLocalStore;
pub use schema::LOCAL_STATE_VERSIONED_SCHEMAS;
pub use sqlite_local_store::SqliteLocalStore;

use anyhow::Result;

pub trait LocalStateStore: Send + Sync {
    fn get_state(&self, key: &str) -> Result<Option<String>>;
    fn set_state(&self, key: &str, value: &str) -> Result<()>;
    fn delete_state(&self, key: &str) -> Result<()>;
}
