//! Domain layer for the fruit store.
//!
//! This crate holds the data model (fruits, customers, orders, payments,
//! stock movements), the validated input types that guard every write path,
//! and the order status state machine.

pub mod customer;
pub mod error;
pub mod fruit;
pub mod order;
pub mod payment;
pub mod stock;

pub use common::{CustomerId, FruitId, Money, OrderId, PaymentId, UserId};
pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use error::DomainError;
pub use fruit::{Fruit, FruitPatch, FruitStats, NewFruit};
pub use order::{Order, OrderDetails, OrderDraft, OrderItem, OrderLine, OrderStatus, OrderSummary};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use stock::{MovementDirection, StockMovement};
