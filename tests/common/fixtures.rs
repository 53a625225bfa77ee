//! JSON record builders shaped like the school backend's responses

use serde_json::{json, Value};

/// A message record. `read_at` is `None` to omit the field entirely,
/// `Some(None)` for an explicit `null`, `Some(Some(instant))` when read.
pub fn message(id: &str, created_at: &str, read_at: Option<Option<&str>>) -> Value {
    let mut record = json!({
        "id": id,
        "createdAt": created_at,
        "subject": format!("Message {}", id),
    });
    if let Some(read_at) = read_at {
        record["readAt"] = json!(read_at);
    }
    record
}

/// A timestamp-only record (partial grade, report card, exam result).
pub fn timestamped(id: &str, updated_at: &str) -> Value {
    json!({
        "_id": id,
        "createdAt": "2023-09-01T08:00:00Z",
        "updatedAt": updated_at,
    })
}

pub fn list(records: Vec<Value>) -> Value {
    Value::Array(records)
}

/// Same records wrapped in the `{ "data": [...] }` envelope.
pub fn enveloped(records: Vec<Value>) -> Value {
    json!({ "data": records })
}
