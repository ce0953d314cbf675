//! Content API read endpoints.
//!
//! - `GET /api/{plural}`: filtered, paged, populated collection
//! - `GET /api/{plural}/{id}`: one entry, 404 when hidden by the state

use axum::extract::{Path, RawQuery, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::content::ReadQuery;
use crate::error::{AppError, AppResult};
use crate::pagination::Pagination;
use crate::populate::PopulatedEntry;
use crate::state::AppState;

/// Collection response body.
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub data: Vec<PopulatedEntry>,
    pub meta: CollectionMeta,
}

#[derive(Debug, Serialize)]
pub struct CollectionMeta {
    pub pagination: Pagination,
}

/// Single entry response body.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub data: PopulatedEntry,
    pub meta: Map<String, Value>,
}

async fn find_many(
    State(state): State<AppState>,
    Path(plural): Path<String>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<CollectionResponse>> {
    let query = ReadQuery::parse(raw.as_deref(), state.entries().limits())?;
    let page = state.entries().find_many(&plural, &query).await?;

    Ok(Json(CollectionResponse {
        data: page.data,
        meta: CollectionMeta {
            pagination: page.pagination,
        },
    }))
}

async fn find_one(
    State(state): State<AppState>,
    Path((plural, id)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<EntryResponse>> {
    let query = ReadQuery::parse(raw.as_deref(), state.entries().limits())?;

    // A malformed id can't name an entry, but an unknown collection wins
    let Ok(id) = Uuid::parse_str(&id) else {
        state.entries().collection(&plural)?;
        return Err(AppError::NotFound);
    };

    let data = state.entries().find_one(&plural, id, &query).await?;
    Ok(Json(EntryResponse {
        data,
        meta: Map::new(),
    }))
}

/// Create the content API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/{plural}", get(find_many))
        .route("/api/{plural}/{id}", get(find_one))
}
