//! Entry model.
//!
//! Entries are the content records of a content type. Attribute values
//! live in a JSON object; the content type schema decides how each value
//! is read (scalar, relation ids, or embedded component).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Content type machine name.
    pub content_type: String,

    /// Publication timestamp. `None` means the entry is a draft.
    pub published_at: Option<DateTime<Utc>>,

    /// Unix timestamp when created.
    pub created: i64,

    /// Attribute storage (JSONB).
    pub fields: serde_json::Value,
}

impl Entry {
    /// Create an empty draft entry of the given content type.
    pub fn new(content_type: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            content_type: content_type.to_string(),
            published_at: None,
            created: Utc::now().timestamp(),
            fields: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Check if this entry carries a publication timestamp.
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// `publishedAt` as rendered by the API: ISO-8601 string or null.
    pub fn published_at_value(&self) -> serde_json::Value {
        match self.published_at {
            Some(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serde_json::Value::Null,
        }
    }
}
