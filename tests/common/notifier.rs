//! Notifier stack wired against a [`TestBackend`](super::TestBackend)
//!
//! Uses the real HTTP fetchers and a SQLite state file in a temp dir, so a
//! test can drop the notifier and reopen the same state to check persistence.

use super::constants::*;
use globalt_notifier::config::EndpointSettings;
use globalt_notifier::local_store::{LocalStateStore, SqliteLocalStore};
use globalt_notifier::notifications::{Aggregator, BackendClient, NotificationBell, WatermarkStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestNotifier {
    pub aggregator: Arc<Aggregator>,
    pub watermarks: Arc<WatermarkStore>,
    pub local_store: Arc<SqliteLocalStore>,
    pub state_db: PathBuf,
}

impl TestNotifier {
    /// Authenticated notifier with a fresh state file inside `dir`.
    pub fn new(base_url: &str, dir: &TempDir) -> Self {
        Self::open(base_url, Some(TEST_TOKEN), &dir.path().join("state.db"))
    }

    /// Notifier whose requests carry no session token.
    pub fn anonymous(base_url: &str, dir: &TempDir) -> Self {
        Self::open(base_url, None, &dir.path().join("state.db"))
    }

    /// Notifier reusing the state file at `state_db`.
    pub fn open(base_url: &str, token: Option<&str>, state_db: &Path) -> Self {
        let local_store =
            Arc::new(SqliteLocalStore::new(state_db).expect("Failed to open state db"));
        let watermarks = Arc::new(WatermarkStore::new(
            local_store.clone() as Arc<dyn LocalStateStore>
        ));

        let backend = BackendClient::new(
            base_url.to_string(),
            REQUEST_TIMEOUT_SECS,
            token.map(String::from),
        )
        .expect("Failed to build backend client");
        let endpoints = EndpointSettings::default();
        let aggregator = Arc::new(Aggregator::new(
            backend.fetchers(endpoints.enabled()),
            watermarks.clone(),
            Duration::from_millis(FETCH_TIMEOUT_MS),
            10,
        ));

        Self {
            aggregator,
            watermarks,
            local_store,
            state_db: state_db.to_path_buf(),
        }
    }

    pub fn bell(&self) -> NotificationBell {
        NotificationBell::new(self.watermarks.clone())
    }
}
