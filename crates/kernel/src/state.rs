//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::content::{ContentTypeRegistry, EntryService, ReadLimits};
use crate::db;
use crate::store::{EntryStore, PgEntryStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Content type and component definitions.
    content_types: ContentTypeRegistry,

    /// Entry storage backend.
    store: Arc<dyn EntryStore>,

    /// Publication-aware read service.
    entries: EntryService,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations and load the schema directory.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        let registry = ContentTypeRegistry::new();
        if config.schema_dir.is_dir() {
            registry
                .load_dir(&config.schema_dir)
                .context("failed to load schema definitions")?;
        } else {
            warn!(dir = %config.schema_dir.display(), "schema directory not found, no collections served");
        }

        let problems = registry.validate();
        if !problems.is_empty() {
            anyhow::bail!("schema is inconsistent: {}", problems.join("; "));
        }

        info!(content_types = registry.len(), "content types registered");

        let store: Arc<dyn EntryStore> = Arc::new(PgEntryStore::new(pool));
        Ok(Self::from_parts(registry, store, config.read_limits()))
    }

    /// Assemble state from ready-made parts.
    pub fn from_parts(
        content_types: ContentTypeRegistry,
        store: Arc<dyn EntryStore>,
        limits: ReadLimits,
    ) -> Self {
        let entries = EntryService::new(content_types.clone(), store.clone(), limits);
        Self {
            inner: Arc::new(AppStateInner {
                content_types,
                store,
                entries,
            }),
        }
    }

    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.inner.content_types
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.inner.store
    }

    pub fn entries(&self) -> &EntryService {
        &self.inner.entries
    }
}
