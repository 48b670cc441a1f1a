//! Order orchestration for the fruit store.
//!
//! [`CheckoutService`] composes the storage layer's transactional operations
//! into the two multi-step workflows that must be atomic: placing an order
//! (stock checks, line items, stock decrement, pending payment) and
//! cancelling one (stock restoration, payment failure, status change). It
//! also carries the thin admin operations for fruits and customers.

pub mod error;
pub mod service;

pub use error::CheckoutError;
pub use service::CheckoutService;
