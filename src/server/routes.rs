use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::item::{DeleteConfirmation, Item, ItemId, ItemPatch, NewItem};
use crate::server::error::{ApiError, ErrorResponse};
use crate::server::AppState;
use crate::storage::{ItemStore, DEFAULT_LIMIT};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Run `f` against a fresh session on the blocking pool.
///
/// The session is dropped (and its connection closed) before this returns,
/// whatever `f` produced.
async fn with_session<T, F>(state: &Arc<AppState>, f: F) -> crate::Result<T>
where
    F: FnOnce(&mut ItemStore) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        let mut session = state.database.session()?;
        f(&mut session)
    })
    .await
    .map_err(|e| crate::Error::Task(e.to_string()))?
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let Json(new_item) = payload?;

    let item = with_session(&state, move |store| store.create(&new_item))
        .await
        .map_err(ApiError::CreateFailed)?;

    tracing::info!(id = item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Item>>> {
    let Query(params) = params?;
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let items = with_session(&state, move |store| store.list(skip, limit))
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ItemId>, PathRejection>,
) -> ApiResult<Json<Item>> {
    let Path(id) = id?;

    with_session(&state, move |store| store.get(id))
        .await
        .map_err(ApiError::Internal)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ItemId>, PathRejection>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    let item = with_session(&state, move |store| store.update(id, &patch))
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(id, "Item updated");
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ItemId>, PathRejection>,
) -> ApiResult<Json<DeleteConfirmation>> {
    let Path(id) = id?;

    let removed = with_session(&state, move |store| store.delete(id))
        .await
        .map_err(ApiError::Internal)?;
    if !removed {
        return Err(ApiError::NotFound);
    }

    tracing::info!(id, "Item deleted");
    Ok(Json(DeleteConfirmation::new(id)))
}

/// Any route outside the item endpoints
pub async fn fallback() -> (StatusCode, Json<ErrorResponse>) {
    detail(StatusCode::NOT_FOUND)
}

/// A known path hit with a method it does not serve
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    detail(StatusCode::METHOD_NOT_ALLOWED)
}

fn detail(status: StatusCode) -> (StatusCode, Json<ErrorResponse>) {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, Json(ErrorResponse { detail: reason.to_string() }))
}
