//! SQLite schema definitions for the client state database.

use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Key/value client state
// =============================================================================

const CLIENT_STATE_TABLE_V1: Table = Table {
    name: "client_state",
    columns: &[
        Column::new("key", SqlType::Text).primary_key(),
        Column::new("value", SqlType::Text).non_null(),
    ],
};

pub const LOCAL_STATE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[CLIENT_STATE_TABLE_V1],
    migration: None,
}];
