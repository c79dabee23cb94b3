use std::collections::HashMap;

use anyhow::anyhow;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::{
    error::ApiError,
    models::{ErrorResponse, HealthResponse, ProductDto},
    AppState,
};
use crate::{
    model::{Category, Product},
    storage::{PendingId, Repository, Storage, UnitOfWork},
};

/// Runs `f` against a fresh unit of work on the blocking pool. The unit of
/// work, and its connection, is dropped before this returns.
pub(crate) async fn with_uow<S, T, F>(storage: S, f: F) -> Result<T, ApiError>
where
    S: Storage + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&S::Uow) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let span = tracing::debug_span!("unit_of_work");
        let _entered = span.enter();
        let uow = storage.begin()?;
        f(&uow)
    })
    .await
    .map_err(|err| ApiError::Internal(anyhow!("unit of work task failed: {err}")))?
}

pub(crate) fn assigned_id(pending: &PendingId, what: &str) -> Result<i64, ApiError> {
    pending
        .get()
        .ok_or_else(|| ApiError::Internal(anyhow!("{what} id was not assigned on commit")))
}

pub(crate) fn category_names<U: UnitOfWork>(uow: &U) -> Result<HashMap<i64, String>, ApiError> {
    Ok(uow
        .categories()
        .get_all()?
        .into_iter()
        .map(|Category { id, name, .. }| (id, name))
        .collect())
}

pub(crate) fn product_dto<U: UnitOfWork>(uow: &U, product: Product) -> Result<ProductDto, ApiError> {
    let category_name = uow
        .categories()
        .get_by_id(product.category_id)?
        .map(|category| category.name);
    Ok(ProductDto::new(product, category_name))
}

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}
