//! Checkout error types.

use common::{FruitId, OrderId};
use domain::{DomainError, OrderStatus};
use storage::StoreError;
use thiserror::Error;

/// Errors surfaced by checkout operations.
///
/// Every operation is a boundary: callers receive one of these, never a raw
/// panic or a bare database error without context.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input failed validation before any transaction opened.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// A line item asked for more units than the fruit has.
    #[error("Insufficient stock for {name}")]
    InsufficientStock { name: String },

    /// A line item referenced a fruit that does not exist.
    #[error("Fruit not found")]
    FruitNotFound(FruitId),

    /// The order does not exist.
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// The requested status change is not in the transition table.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Proof was submitted for an order with no pending payment.
    #[error("Order has no pending payment")]
    NoPendingPayment,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
