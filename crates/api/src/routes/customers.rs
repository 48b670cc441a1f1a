//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::{Customer, CustomerPatch, NewCustomer};
use storage::Store;

use super::{AppState, parse_id};
use crate::error::ApiError;

/// POST /customers — register a customer.
#[tracing::instrument(skip(state, new))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state.checkout.create_customer(new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers — list customers.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.checkout.customers().await?))
}

/// GET /customers/:id — load one customer.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.customer(customer_id).await?))
}

/// PATCH /customers/:id — partially update a customer.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.update_customer(customer_id, patch).await?))
}

/// DELETE /customers/:id — remove a customer without orders.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_id(&id)?);
    state.checkout.delete_customer(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
