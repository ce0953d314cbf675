//! Entry read service.
//!
//! Ties the pieces of a content API read together: resolve the collection,
//! derive the publication filter, validate populate paths, count and list
//! the visible roots, then populate the page.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::read_query::{ReadLimits, ReadQuery};
use super::type_registry::ContentTypeRegistry;
use crate::error::AppError;
use crate::pagination::{Pagination, count_and_slice};
use crate::populate::{PopulatedEntry, PopulationEngine};
use crate::store::{EntryStore, StoreWindow};
use vellum_sdk::types::ContentTypeDefinition;

/// One page of a collection read.
#[derive(Debug, Clone)]
pub struct EntryPage {
    pub data: Vec<PopulatedEntry>,
    pub pagination: Pagination,
}

/// Service for publication-aware entry reads.
#[derive(Clone)]
pub struct EntryService {
    inner: Arc<EntryServiceInner>,
}

struct EntryServiceInner {
    registry: ContentTypeRegistry,
    store: Arc<dyn EntryStore>,
    engine: PopulationEngine,
    limits: ReadLimits,
}

impl EntryService {
    pub fn new(registry: ContentTypeRegistry, store: Arc<dyn EntryStore>, limits: ReadLimits) -> Self {
        let engine = PopulationEngine::new(registry.clone(), store.clone(), limits.max_populate_depth);
        Self {
            inner: Arc::new(EntryServiceInner {
                registry,
                store,
                engine,
                limits,
            }),
        }
    }

    pub fn limits(&self) -> &ReadLimits {
        &self.inner.limits
    }

    /// Resolve a plural route name to its content type.
    pub fn collection(&self, plural: &str) -> Result<ContentTypeDefinition, AppError> {
        self.inner
            .registry
            .get_by_plural(plural)
            .ok_or_else(|| AppError::UnknownContentType(plural.to_string()))
    }

    /// List a collection under `query`.
    ///
    /// Populate paths are validated before the store is touched.
    pub async fn find_many(&self, plural: &str, query: &ReadQuery) -> Result<EntryPage, AppError> {
        let content_type = self.collection(plural)?;
        let filter = query.state.predicate();
        let plan = self.inner.engine.plan(&content_type, &query.populate)?;

        let store = &self.inner.store;
        let name = content_type.machine_name.as_str();
        let scope = filter.scope(&content_type);

        // Windowed reads push count and slice down to the store; the scope
        // admits exactly what the filter does, so totals agree
        let (page, pagination) = match query.page.offset_limit() {
            None => {
                let roots = store.list(name, scope, None).await?;
                count_and_slice(filter.retain(&content_type, roots), query.page)
            }
            Some((offset, limit)) => {
                let window = StoreWindow { offset, limit };
                let (total, roots) =
                    tokio::try_join!(store.count(name, scope), store.list(name, scope, Some(window)))?;
                (filter.retain(&content_type, roots), query.page.paginate(total))
            }
        };
        let data = self.inner.engine.populate_planned(page, &plan, filter).await?;

        info!(
            collection = %plural,
            state = %query.state,
            total = pagination.total,
            returned = data.len(),
            "collection read"
        );

        Ok(EntryPage { data, pagination })
    }

    /// Read one entry of a collection.
    ///
    /// An entry the publication state hides is reported as not found.
    pub async fn find_one(
        &self,
        plural: &str,
        id: Uuid,
        query: &ReadQuery,
    ) -> Result<PopulatedEntry, AppError> {
        let content_type = self.collection(plural)?;
        let filter = query.state.predicate();
        let plan = self.inner.engine.plan(&content_type, &query.populate)?;

        let entry = self
            .inner
            .store
            .fetch_by_ids(&content_type.machine_name, &[id])
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound)?;

        if !filter.admits(&content_type, &entry) {
            debug!(collection = %plural, %id, state = %query.state, "entry hidden by publication state");
            return Err(AppError::NotFound);
        }

        self.inner
            .engine
            .populate_planned(vec![entry], &plan, filter)
            .await?
            .pop()
            .ok_or(AppError::NotFound)
    }
}
