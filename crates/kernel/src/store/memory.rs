//! In-memory entry store.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{EntryStore, StoreError, StoreScope, StoreWindow, check_entry};
use crate::models::Entry;

/// Entry tables keyed by content type, each kept in insertion order.
#[derive(Default)]
pub struct MemoryEntryStore {
    tables: DashMap<String, Vec<Entry>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&self, entry: Entry) {
        let mut table = self.tables.entry(entry.content_type.clone()).or_default();
        match table.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => table.push(entry),
        }
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = Entry>) {
        for entry in entries {
            self.insert(entry);
        }
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn list(
        &self,
        content_type: &str,
        scope: StoreScope,
        window: Option<StoreWindow>,
    ) -> Result<Vec<Entry>, StoreError> {
        let Some(table) = self.tables.get(content_type) else {
            return Ok(Vec::new());
        };

        let (skip, take) = match window {
            Some(w) => (
                usize::try_from(w.offset).unwrap_or(usize::MAX),
                usize::try_from(w.limit).unwrap_or(usize::MAX),
            ),
            None => (0, usize::MAX),
        };

        table
            .iter()
            .filter(|e| in_scope(e, scope))
            .skip(skip)
            .take(take)
            .cloned()
            .map(check_entry)
            .collect()
    }

    async fn count(&self, content_type: &str, scope: StoreScope) -> Result<u64, StoreError> {
        let count = self
            .tables
            .get(content_type)
            .map(|table| table.iter().filter(|e| in_scope(e, scope)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn fetch_by_ids(
        &self,
        content_type: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Entry>, StoreError> {
        let Some(table) = self.tables.get(content_type) else {
            return Ok(Vec::new());
        };

        let wanted: HashSet<&Uuid> = ids.iter().collect();
        table
            .iter()
            .filter(|e| wanted.contains(&e.id))
            .cloned()
            .map(check_entry)
            .collect()
    }
}

fn in_scope(entry: &Entry, scope: StoreScope) -> bool {
    scope == StoreScope::All || entry.is_published()
}
