//! Notification data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A notification category, one per independent backend feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryId {
    Messages,
    PartialGrades,
    ReportCards,
    ExternalResults,
}

impl CategoryId {
    pub const ALL: [CategoryId; 4] = [
        CategoryId::Messages,
        CategoryId::PartialGrades,
        CategoryId::ReportCards,
        CategoryId::ExternalResults,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Messages => "messages",
            CategoryId::PartialGrades => "partialGrades",
            CategoryId::ReportCards => "reportCards",
            CategoryId::ExternalResults => "externalResults",
        }
    }

    /// Accepts the persisted camelCase name as well as snake_case, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        CategoryId::ALL
            .into_iter()
            .find(|c| c.as_str().to_ascii_lowercase() == normalized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryId::Messages => "Messages",
            CategoryId::PartialGrades => "Partial grades",
            CategoryId::ReportCards => "Report cards",
            CategoryId::ExternalResults => "Exam results",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side read status carried by a record, when its type has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Read,
    Unread,
    /// The record type (or this particular record) carries no read flag.
    NotTracked,
}

/// Maps a missing field to `None`, an explicit `null` to `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A message from the communications log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMessage")]
pub struct MessageRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Option<DateTime<Utc>>>,
    pub title: Option<String>,
}

/// A timestamp-only record: partial grade, report card or external result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTimestamped")]
pub struct TimestampedRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
}

/// Backends send the id as `id`, `_id`, or both when virtuals are on.
fn resolve_id(id: Option<String>, mongo_id: Option<String>) -> Result<String, String> {
    id.or(mongo_id)
        .ok_or_else(|| "record has neither `id` nor `_id`".to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present")]
    read_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subject: Option<String>,
}

impl TryFrom<RawMessage> for MessageRecord {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        Ok(MessageRecord {
            id: resolve_id(raw.id, raw.mongo_id)?,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            read_at: raw.read_at,
            title: raw.title.or(raw.subject),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimestamped {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    title: Option<String>,
}

impl TryFrom<RawTimestamped> for TimestampedRecord {
    type Error = String;

    fn try_from(raw: RawTimestamped) -> Result<Self, Self::Error> {
        Ok(TimestampedRecord {
            id: resolve_id(raw.id, raw.mongo_id)?,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            title: raw.title,
        })
    }
}

/// A single notifiable item, tagged by the category it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Message(MessageRecord),
    PartialGrade(TimestampedRecord),
    ReportCard(TimestampedRecord),
    ExternalResult(TimestampedRecord),
}

impl SourceRecord {
    pub fn category(&self) -> CategoryId {
        match self {
            SourceRecord::Message(_) => CategoryId::Messages,
            SourceRecord::PartialGrade(_) => CategoryId::PartialGrades,
            SourceRecord::ReportCard(_) => CategoryId::ReportCards,
            SourceRecord::ExternalResult(_) => CategoryId::ExternalResults,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SourceRecord::Message(m) => &m.id,
            SourceRecord::PartialGrade(r)
            | SourceRecord::ReportCard(r)
            | SourceRecord::ExternalResult(r) => &r.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            SourceRecord::Message(m) => m.title.as_deref(),
            SourceRecord::PartialGrade(r)
            | SourceRecord::ReportCard(r)
            | SourceRecord::ExternalResult(r) => r.title.as_deref(),
        }
    }

    /// The update instant, or the creation instant when the record was never updated.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        match self {
            SourceRecord::Message(m) => m.updated_at.or(m.created_at),
            SourceRecord::PartialGrade(r)
            | SourceRecord::ReportCard(r)
            | SourceRecord::ExternalResult(r) => r.updated_at.or(r.created_at),
        }
    }

    pub fn read_state(&self) -> ReadState {
        match self {
            SourceRecord::Message(m) => match m.read_at {
                Some(Some(_)) => ReadState::Read,
                Some(None) => ReadState::Unread,
                None => ReadState::NotTracked,
            },
            _ => ReadState::NotTracked,
        }
    }
}

/// Number of new records for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeltaCount {
    pub category: CategoryId,
    pub count: usize,
}

/// One line of the detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelEntry {
    pub category: CategoryId,
    pub id: String,
    pub title: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

/// The full derived view shown to the user after one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateNotificationState {
    pub counts: Vec<DeltaCount>,
    pub total: usize,
    pub entries: Vec<PanelEntry>,
}

impl AggregateNotificationState {
    pub fn count_for(&self, category: CategoryId) -> usize {
        self.counts
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.count)
            .sum()
    }
}
