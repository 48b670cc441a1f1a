//! Order placement, lifecycle, and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, FruitId, Money, OrderId, UserId};
use domain::{Order, OrderDetails, OrderDraft, OrderLine, OrderSummary, Payment, PaymentMethod};
use serde::Deserialize;
use storage::Store;

use super::{AppState, parse_id};
use crate::error::ApiError;

/// Orders returned by the list endpoint when no limit is given.
const DEFAULT_LIST_LIMIT: i64 = 50;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub user_id: Option<String>,
    pub payment_method: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub fruit_id: String,
    pub quantity: u32,
    pub price_cents: i64,
}

#[derive(Deserialize)]
pub struct PaymentProofRequest {
    pub proof_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

impl CreateOrderRequest {
    fn into_draft(self) -> Result<OrderDraft, ApiError> {
        let customer_id = CustomerId::from_uuid(parse_id(&self.customer_id)?);
        let user_id = match self.user_id {
            Some(ref id) => Some(UserId::from_uuid(parse_id(id)?)),
            None => None,
        };
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid payment method: {}", self.payment_method))
        })?;

        let lines = self
            .items
            .iter()
            .map(|item| {
                Ok(OrderLine {
                    fruit_id: FruitId::from_uuid(parse_id(&item.fruit_id)?),
                    quantity: item.quantity,
                    unit_price: Money::from_cents(item.price_cents),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(OrderDraft {
            customer_id,
            user_id,
            payment_method,
            lines,
        })
    }
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let draft = req.into_draft()?;
    let order = state.checkout.create_order(draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list recent orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let orders = state.checkout.orders(limit).await?;
    Ok(Json(orders))
}

/// GET /orders/summary — order counts and revenue.
#[tracing::instrument(skip(state))]
pub async fn summary<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<OrderSummary>, ApiError> {
    Ok(Json(state.checkout.order_summary().await?))
}

/// GET /orders/:id — load an order with its items and payments.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.order(order_id).await?))
}

/// POST /orders/:id/cancel — cancel a processing order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.cancel_order(order_id).await?))
}

/// POST /orders/:id/complete — mark a processing order completed.
#[tracing::instrument(skip(state))]
pub async fn complete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    Ok(Json(state.checkout.complete_order(order_id).await?))
}

/// POST /orders/:id/payment-proof — attach a proof URL to the pending payment.
#[tracing::instrument(skip(state, req))]
pub async fn payment_proof<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PaymentProofRequest>,
) -> Result<Json<Payment>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    let payment = state
        .checkout
        .attach_payment_proof(order_id, &req.proof_url)
        .await?;
    Ok(Json(payment))
}
