//! PostgreSQL entry store.
//!
//! Reads the `entry` table (see `migrations/`). SQL is generated with
//! SeaQuery so the publication push-down and id batches stay typed.

use async_trait::async_trait;
use sea_query::{Asterisk, Expr, Iden, Order, PostgresQueryBuilder, Query, SelectStatement};
use sqlx::PgPool;
use uuid::Uuid;

use super::{EntryStore, StoreError, StoreScope, StoreWindow, check_entry};
use crate::models::Entry;

#[derive(Iden)]
enum EntryIden {
    #[iden = "entry"]
    Table,
    Id,
    ContentType,
    PublishedAt,
    Created,
    Fields,
}

/// SQL generation for entry reads.
pub struct EntryQueryBuilder;

impl EntryQueryBuilder {
    fn select() -> SelectStatement {
        let mut query = Query::select();
        query
            .columns([
                EntryIden::Id,
                EntryIden::ContentType,
                EntryIden::PublishedAt,
                EntryIden::Created,
                EntryIden::Fields,
            ])
            .from(EntryIden::Table);
        query
    }

    fn add_scope(query: &mut SelectStatement, content_type: &str, scope: StoreScope) {
        query.and_where(Expr::col(EntryIden::ContentType).eq(content_type));

        if scope == StoreScope::PublishedOnly {
            query.and_where(Expr::col(EntryIden::PublishedAt).is_not_null());
        }
    }

    /// Rows of a content type, oldest first, optionally windowed.
    pub fn build_list(content_type: &str, scope: StoreScope, window: Option<StoreWindow>) -> String {
        let mut query = Self::select();
        Self::add_scope(&mut query, content_type, scope);

        query
            .order_by(EntryIden::Created, Order::Asc)
            .order_by(EntryIden::Id, Order::Asc);

        // LIMIT/OFFSET for pagination
        if let Some(window) = window {
            query.limit(window.limit);
            query.offset(window.offset);
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// COUNT query matching `build_list` without a window.
    pub fn build_count(content_type: &str, scope: StoreScope) -> String {
        let mut query = Query::select();
        query
            .expr(Expr::col(Asterisk).count())
            .from(EntryIden::Table);
        Self::add_scope(&mut query, content_type, scope);

        query.to_string(PostgresQueryBuilder)
    }

    /// Batch lookup by id within one content type.
    pub fn build_fetch_by_ids(content_type: &str, ids: &[Uuid]) -> String {
        let mut query = Self::select();
        query
            .and_where(Expr::col(EntryIden::ContentType).eq(content_type))
            .and_where(Expr::col(EntryIden::Id).is_in(ids.iter().copied()));

        query.to_string(PostgresQueryBuilder)
    }
}

/// Entry store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn list(
        &self,
        content_type: &str,
        scope: StoreScope,
        window: Option<StoreWindow>,
    ) -> Result<Vec<Entry>, StoreError> {
        let sql = EntryQueryBuilder::build_list(content_type, scope, window);
        let rows = sqlx::query_as::<_, Entry>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(check_entry).collect()
    }

    async fn count(&self, content_type: &str, scope: StoreScope) -> Result<u64, StoreError> {
        let sql = EntryQueryBuilder::build_count(content_type, scope);
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn fetch_by_ids(
        &self,
        content_type: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Entry>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = EntryQueryBuilder::build_fetch_by_ids(content_type, ids);
        let rows = sqlx::query_as::<_, Entry>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(check_entry).collect()
    }

    async fn ping(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}
