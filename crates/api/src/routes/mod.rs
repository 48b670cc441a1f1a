//! HTTP route handlers.

pub mod customers;
pub mod fruits;
pub mod health;
pub mod metrics;
pub mod orders;

use checkout::CheckoutService;
use storage::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub checkout: CheckoutService<S>,
}

/// Parses a path or body id, mapping failure to a 400.
pub(crate) fn parse_id(id: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
