//! Shared value types used across the fruit store workspace.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CustomerId, FruitId, OrderId, PaymentId, UserId};
