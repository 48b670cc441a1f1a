//! Fruit catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::FruitId;
use domain::{Fruit, FruitPatch, FruitStats, NewFruit, StockMovement};
use serde::Deserialize;
use storage::Store;

use super::{AppState, parse_id};
use crate::error::ApiError;

/// Movements returned per fruit when no limit is given.
const DEFAULT_MOVEMENT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct MovementParams {
    pub limit: Option<i64>,
}

/// POST /fruits — add a fruit to the catalog.
#[tracing::instrument(skip(state, new))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewFruit>,
) -> Result<(StatusCode, Json<Fruit>), ApiError> {
    let fruit = state.checkout.create_fruit(new).await?;
    Ok((StatusCode::CREATED, Json(fruit)))
}

/// GET /fruits — list the whole catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Fruit>>, ApiError> {
    Ok(Json(state.checkout.fruits().await?))
}

/// GET /fruits/in-stock — fruits that can currently be ordered.
#[tracing::instrument(skip(state))]
pub async fn list_in_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Fruit>>, ApiError> {
    Ok(Json(state.checkout.fruits_in_stock().await?))
}

/// GET /fruits/stats — catalog stock statistics.
#[tracing::instrument(skip(state))]
pub async fn stats<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<FruitStats>, ApiError> {
    Ok(Json(state.checkout.fruit_stats().await?))
}

/// GET /fruits/:id — load one fruit.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Fruit>, ApiError> {
    let fruit_id = FruitId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.fruit(fruit_id).await?))
}

/// PATCH /fruits/:id — partially update a fruit.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<FruitPatch>,
) -> Result<Json<Fruit>, ApiError> {
    let fruit_id = FruitId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.update_fruit(fruit_id, patch).await?))
}

/// DELETE /fruits/:id — remove a fruit that has never been ordered.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let fruit_id = FruitId::from_uuid(parse_id(&id)?);
    state.checkout.delete_fruit(fruit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /fruits/:id/movements — recent stock movements, newest first.
#[tracing::instrument(skip(state))]
pub async fn movements<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<MovementParams>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let fruit_id = FruitId::from_uuid(parse_id(&id)?);
    let limit = params.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT);
    Ok(Json(state.checkout.stock_movements(fruit_id, limit).await?))
}
