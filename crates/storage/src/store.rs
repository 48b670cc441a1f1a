//! Store traits: the persistence contract consumed by the checkout service.

use async_trait::async_trait;
use common::{CustomerId, FruitId, OrderId};
use domain::{
    Customer, Fruit, FruitStats, Order, OrderDetails, OrderItem, OrderStatus, OrderSummary,
    Payment, StockMovement,
};

use crate::error::Result;

/// The persistence collaborator.
///
/// Single-row reads and writes run directly against the backend; grouped
/// writes go through [`Store::begin`], which returns a [`StoreTx`] whose
/// effects are invisible until [`StoreTx::commit`] and discarded entirely if
/// the transaction is dropped first.
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    // -- fruits --

    /// Point lookup of a fruit.
    async fn fruit(&self, id: FruitId) -> Result<Option<Fruit>>;

    /// All fruits, most recently created first.
    async fn fruits(&self) -> Result<Vec<Fruit>>;

    /// Fruits with stock available, ordered by name.
    async fn fruits_in_stock(&self) -> Result<Vec<Fruit>>;

    /// Inserts a new fruit row.
    async fn insert_fruit(&self, fruit: &Fruit) -> Result<()>;

    /// Rewrites a fruit row. Fails with `NotFound` if the row is gone.
    async fn update_fruit(&self, fruit: &Fruit) -> Result<()>;

    /// Deletes a fruit. Fails with `Conflict` while any order item
    /// references it.
    async fn delete_fruit(&self, id: FruitId) -> Result<()>;

    /// Catalog stock statistics.
    async fn fruit_stats(&self) -> Result<FruitStats>;

    /// Most recent stock movements for a fruit.
    async fn stock_movements(&self, fruit_id: FruitId, limit: i64) -> Result<Vec<StockMovement>>;

    // -- customers --

    /// Point lookup of a customer.
    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// All customers, most recently created first.
    async fn customers(&self) -> Result<Vec<Customer>>;

    /// Inserts a customer. Fails with `DuplicateEmail` on an email clash.
    async fn insert_customer(&self, customer: &Customer) -> Result<()>;

    /// Rewrites a customer row. Fails with `DuplicateEmail` or `NotFound`.
    async fn update_customer(&self, customer: &Customer) -> Result<()>;

    /// Deletes a customer. Fails with `Conflict` while they have orders.
    async fn delete_customer(&self, id: CustomerId) -> Result<()>;

    // -- orders --

    /// An order with its line items and payments.
    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>>;

    /// Recent orders, newest first.
    async fn orders(&self, limit: i64) -> Result<Vec<Order>>;

    /// Aggregate order counts and revenue.
    async fn order_summary(&self) -> Result<OrderSummary>;

    /// Attaches a proof-of-payment URL to the order's pending payment.
    /// Returns `None` when the order has no pending payment.
    async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Payment>>;
}

/// A unit of work. Every write made through a `StoreTx` is atomic with the
/// others: either `commit` lands them all or none survive.
#[async_trait]
pub trait StoreTx: Send {
    /// Re-reads a fruit inside the transaction.
    async fn fruit(&mut self, id: FruitId) -> Result<Option<Fruit>>;

    /// Inserts the order row. Fails with `DuplicateOrderNumber` if the
    /// generated number collides.
    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Inserts one line item.
    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()>;

    /// Atomically decrements stock if and only if enough remains.
    /// Returns false (and changes nothing) when stock is insufficient.
    async fn deduct_stock(&mut self, id: FruitId, quantity: u32) -> Result<bool>;

    /// Increments stock back, e.g. on cancellation.
    async fn restore_stock(&mut self, id: FruitId, quantity: u32) -> Result<()>;

    /// Inserts a payment row.
    async fn insert_payment(&mut self, payment: &Payment) -> Result<()>;

    /// Appends a stock movement entry.
    async fn insert_stock_movement(&mut self, movement: &StockMovement) -> Result<()>;

    /// Loads an order with its line items inside the transaction.
    async fn order_with_items(&mut self, id: OrderId) -> Result<Option<(Order, Vec<OrderItem>)>>;

    /// Marks every payment of the order as failed; returns how many rows
    /// changed.
    async fn mark_payments_failed(&mut self, order_id: OrderId) -> Result<u64>;

    /// Transitions the order status, but only while the row is still in
    /// `from`. Returns `None` (changing nothing) when a concurrent
    /// transaction moved the order on first.
    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>>;

    /// Commits the transaction.
    async fn commit(self: Box<Self>) -> Result<()>;
}
