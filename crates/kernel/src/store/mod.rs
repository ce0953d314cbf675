//! Entry store abstraction.
//!
//! The read engine only ever talks to entries through [`EntryStore`]:
//! - [`MemoryEntryStore`]: DashMap-backed tables, used by tests and embedders
//! - [`PgEntryStore`]: PostgreSQL `entry` table, queries built with SeaQuery

mod memory;
mod postgres;

pub use memory::MemoryEntryStore;
pub use postgres::{EntryQueryBuilder, PgEntryStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Entry;

/// Errors surfaced by an entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("malformed entry {id}: {reason}")]
    Malformed { id: Uuid, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Row scope a store applies when listing or counting a content type.
///
/// Stores must honor it exactly: paged reads take `total` from `count` and
/// the rows from a windowed `list`, both under the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    All,
    PublishedOnly,
}

/// Row window for a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreWindow {
    pub offset: u64,
    pub limit: u64,
}

/// Read access to persisted entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Entries of a content type, in creation order, optionally windowed.
    async fn list(
        &self,
        content_type: &str,
        scope: StoreScope,
        window: Option<StoreWindow>,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Number of entries `list` would return without a window.
    async fn count(&self, content_type: &str, scope: StoreScope) -> Result<u64, StoreError>;

    /// Entries of a content type with the given ids. Order is unspecified
    /// and missing ids are skipped.
    async fn fetch_by_ids(&self, content_type: &str, ids: &[Uuid])
    -> Result<Vec<Entry>, StoreError>;

    /// Whether the backing store answers.
    async fn ping(&self) -> bool {
        true
    }
}

/// Reject rows whose attribute storage isn't a JSON object.
pub(crate) fn check_entry(entry: Entry) -> Result<Entry, StoreError> {
    if entry.fields.is_object() {
        Ok(entry)
    } else {
        Err(StoreError::Malformed {
            id: entry.id,
            reason: "fields is not a JSON object".to_string(),
        })
    }
}

/// Read relation target ids from a stored attribute value.
///
/// Accepts a single id, an array of ids, or `{ "id": … }` objects.
/// Values that aren't UUIDs are skipped with a warning.
pub fn relation_ids(value: Option<&serde_json::Value>) -> Vec<Uuid> {
    fn one(value: &serde_json::Value) -> Option<Uuid> {
        let raw = match value {
            serde_json::Value::String(s) => s.as_str(),
            serde_json::Value::Object(obj) => obj.get("id")?.as_str()?,
            _ => return None,
        };
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(value = %raw, "skipping non-uuid relation target");
                None
            }
        }
    }

    match value {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items.iter().filter_map(one).collect(),
        Some(other) => one(other).into_iter().collect(),
    }
}
