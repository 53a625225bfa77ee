use super::schema::LOCAL_STATE_VERSIONED_SCHEMAS;
use super::LocalStateStore;
use crate::sqlite_persistence::open_versioned;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct SqliteLocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocalStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, LOCAL_STATE_VERSIONED_SCHEMAS, "client state")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl LocalStateStore for SqliteLocalStore {
    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM client_state WHERE key = ?1")?;

        let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;

        Ok(value)
    }

    fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO client_state (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteLocalStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteLocalStore::new(dir.path().join("client.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_state_get_nonexistent() {
        let (_dir, store) = create_test_store();
        assert!(store.get_state("missing").unwrap().is_none());
    }

    #[test]
    fn test_state_set_overwrite_and_delete() {
        let (_dir, store) = create_test_store();

        store.set_state("k", "first").unwrap();
        store.set_state("k", "second").unwrap();
        assert_eq!(store.get_state("k").unwrap().as_deref(), Some("second"));

        store.delete_state("k").unwrap();
        assert!(store.get_state("k").unwrap().is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.db");

        SqliteLocalStore::new(&path)
            .unwrap()
            .set_state("persisted", "yes")
            .unwrap();

        let reopened = SqliteLocalStore::new(&path).unwrap();
        assert_eq!(
            reopened.get_state("persisted").unwrap().as_deref(),
            Some("yes")
        );
    }

    #[test]
    fn test_database_is_created_at_latest_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.db");
        SqliteLocalStore::new(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        let latest = LOCAL_STATE_VERSIONED_SCHEMAS.last().unwrap().version as i64;
        assert_eq!(version, crate::sqlite_persistence::BASE_DB_VERSION as i64 + latest);
    }
}
