//! HTTP API server with observability for the fruit store.
//!
//! Provides REST endpoints for orders, the fruit catalog, and customers,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use checkout::CheckoutService;
use metrics_exporter_prometheus::PrometheusHandle;
use storage::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/summary", get(routes::orders::summary::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/complete", post(routes::orders::complete::<S>))
        .route(
            "/orders/{id}/payment-proof",
            post(routes::orders::payment_proof::<S>),
        )
        .route("/fruits", post(routes::fruits::create::<S>))
        .route("/fruits", get(routes::fruits::list::<S>))
        .route("/fruits/in-stock", get(routes::fruits::list_in_stock::<S>))
        .route("/fruits/stats", get(routes::fruits::stats::<S>))
        .route("/fruits/{id}", get(routes::fruits::get::<S>))
        .route("/fruits/{id}", patch(routes::fruits::update::<S>))
        .route("/fruits/{id}", delete(routes::fruits::delete::<S>))
        .route("/fruits/{id}/movements", get(routes::fruits::movements::<S>))
        .route("/customers", post(routes::customers::create::<S>))
        .route("/customers", get(routes::customers::list::<S>))
        .route("/customers/{id}", get(routes::customers::get::<S>))
        .route("/customers/{id}", patch(routes::customers::update::<S>))
        .route("/customers/{id}", delete(routes::customers::delete::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_state<S: Store + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        checkout: CheckoutService::new(store),
    })
}
