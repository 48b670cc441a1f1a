//! The checkout service: order placement, cancellation, and the admin
//! operations around them.

use std::time::Instant;

use common::{CustomerId, FruitId, OrderId};
use domain::order::generate_order_number;
use domain::{
    Customer, CustomerPatch, DomainError, Fruit, FruitPatch, FruitStats, NewCustomer, NewFruit,
    Order, OrderDetails, OrderDraft, OrderItem, OrderStatus, OrderSummary, Payment, StockMovement,
};
use storage::{Store, StoreError};

use crate::error::CheckoutError;

/// How many times order creation retries after an order-number collision.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Service for placing, cancelling, and inspecting orders.
///
/// Generic over the [`Store`] backend so the same orchestration runs against
/// Postgres in production and the in-memory store in tests.
pub struct CheckoutService<S> {
    store: S,
}

impl<S: Store> CheckoutService<S> {
    /// Creates a new service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // -- orders --

    /// Places an order for a validated cart.
    ///
    /// Atomically creates the order row, its line items, one "out" stock
    /// movement per line, and a pending payment for the total, decrementing
    /// each fruit's stock along the way. Any failure rolls the whole
    /// transaction back: no partial order survives. An order-number
    /// collision retries with a fresh number.
    #[tracing::instrument(skip(self, draft), fields(customer_id = %draft.customer_id, lines = draft.lines.len()))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<Order, CheckoutError> {
        draft.validate()?;
        let started = Instant::now();

        let mut attempts = 0;
        let order = loop {
            attempts += 1;
            let order = Order::from_draft(&draft, generate_order_number());
            match self.place(&draft, order).await {
                Ok(order) => break order,
                Err(CheckoutError::Store(StoreError::DuplicateOrderNumber(number)))
                    if attempts < MAX_ORDER_NUMBER_ATTEMPTS =>
                {
                    tracing::warn!(%number, "order number collision, retrying with a fresh number");
                }
                Err(e) => {
                    metrics::counter!("orders_failed_total").increment(1);
                    return Err(e);
                }
            }
        };

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_number = %order.order_number,
            total_cents = order.total.cents(),
            "order placed"
        );
        Ok(order)
    }

    /// One creation attempt inside a single transaction.
    async fn place(&self, draft: &OrderDraft, order: Order) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;
        tx.insert_order(&order).await?;

        for line in &draft.lines {
            let fruit = tx
                .fruit(line.fruit_id)
                .await?
                .ok_or(CheckoutError::FruitNotFound(line.fruit_id))?;

            tx.insert_order_item(&OrderItem {
                order_id: order.id,
                fruit_id: line.fruit_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal(),
            })
            .await?;

            // The decrement is the authoritative stock check; the read above
            // only supplies the name for the error message.
            if !tx.deduct_stock(line.fruit_id, line.quantity).await? {
                return Err(CheckoutError::InsufficientStock { name: fruit.name });
            }

            tx.insert_stock_movement(&StockMovement::outgoing(
                line.fruit_id,
                line.quantity,
                format!("Order {} placed", order.order_number),
            ))
            .await?;
        }

        tx.insert_payment(&Payment::pending(
            order.id,
            order.total,
            order.payment_method,
        ))
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Cancels a processing order.
    ///
    /// Atomically restores every line item's stock, logs an "in" movement
    /// per line, marks all the order's payments failed, and sets the order
    /// status to cancelled. Cancelling an order that is not in the
    /// processing state is an error, not a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;
        let (order, items) = tx
            .order_with_items(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        for item in &items {
            tx.restore_stock(item.fruit_id, item.quantity).await?;
            tx.insert_stock_movement(&StockMovement::incoming(
                item.fruit_id,
                item.quantity,
                format!("Order {} cancelled", order.order_number),
            ))
            .await?;
        }

        tx.mark_payments_failed(order_id).await?;
        // Conditional on the status still being what we read: if a racing
        // transaction cancelled or completed the order first, the whole
        // transaction (restorations included) rolls back.
        let cancelled = tx
            .set_order_status(order_id, order.status, OrderStatus::Cancelled)
            .await?
            .ok_or(CheckoutError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            })?;
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_number = %cancelled.order_number, "order cancelled");
        Ok(cancelled)
    }

    /// Marks a processing order as completed.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, order_id: OrderId) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;
        let (order, _) = tx
            .order_with_items(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(OrderStatus::Completed) {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Completed,
            });
        }

        let completed = tx
            .set_order_status(order_id, order.status, OrderStatus::Completed)
            .await?
            .ok_or(CheckoutError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Completed,
            })?;
        tx.commit().await?;
        Ok(completed)
    }

    /// Attaches a proof-of-payment URL to the order's pending payment.
    ///
    /// Deliberately not transactional with order creation: an order with a
    /// pending payment and no proof is a normal intermediate state.
    #[tracing::instrument(skip(self, proof_url))]
    pub async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        proof_url: &str,
    ) -> Result<Payment, CheckoutError> {
        if proof_url.trim().is_empty() {
            return Err(DomainError::MissingProofUrl.into());
        }
        if self.store.order_details(order_id).await?.is_none() {
            return Err(CheckoutError::OrderNotFound(order_id));
        }
        self.store
            .attach_payment_proof(order_id, proof_url)
            .await?
            .ok_or(CheckoutError::NoPendingPayment)
    }

    /// Loads an order with its line items and payments.
    pub async fn order(&self, order_id: OrderId) -> Result<OrderDetails, CheckoutError> {
        self.store
            .order_details(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }

    /// Lists recent orders, newest first.
    pub async fn orders(&self, limit: i64) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.store.orders(limit).await?)
    }

    /// Aggregate order counts and revenue.
    pub async fn order_summary(&self) -> Result<OrderSummary, CheckoutError> {
        Ok(self.store.order_summary().await?)
    }

    // -- fruits --

    /// Adds a fruit to the catalog.
    #[tracing::instrument(skip(self, new))]
    pub async fn create_fruit(&self, new: NewFruit) -> Result<Fruit, CheckoutError> {
        let fruit = Fruit::create(new)?;
        self.store.insert_fruit(&fruit).await?;
        Ok(fruit)
    }

    /// Applies a partial update to a fruit.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_fruit(
        &self,
        id: FruitId,
        patch: FruitPatch,
    ) -> Result<Fruit, CheckoutError> {
        let mut fruit = self
            .store
            .fruit(id)
            .await?
            .ok_or(CheckoutError::FruitNotFound(id))?;
        fruit.apply(patch)?;
        self.store.update_fruit(&fruit).await?;
        Ok(fruit)
    }

    /// Removes a fruit that has never been ordered.
    #[tracing::instrument(skip(self))]
    pub async fn delete_fruit(&self, id: FruitId) -> Result<(), CheckoutError> {
        Ok(self.store.delete_fruit(id).await?)
    }

    /// Point lookup of a fruit.
    pub async fn fruit(&self, id: FruitId) -> Result<Fruit, CheckoutError> {
        self.store
            .fruit(id)
            .await?
            .ok_or(CheckoutError::FruitNotFound(id))
    }

    /// All fruits, most recently created first.
    pub async fn fruits(&self) -> Result<Vec<Fruit>, CheckoutError> {
        Ok(self.store.fruits().await?)
    }

    /// Fruits that can currently be ordered.
    pub async fn fruits_in_stock(&self) -> Result<Vec<Fruit>, CheckoutError> {
        Ok(self.store.fruits_in_stock().await?)
    }

    /// Catalog stock statistics.
    pub async fn fruit_stats(&self) -> Result<FruitStats, CheckoutError> {
        Ok(self.store.fruit_stats().await?)
    }

    /// Recent stock movements for a fruit.
    pub async fn stock_movements(
        &self,
        fruit_id: FruitId,
        limit: i64,
    ) -> Result<Vec<StockMovement>, CheckoutError> {
        Ok(self.store.stock_movements(fruit_id, limit).await?)
    }

    // -- customers --

    /// Registers a customer.
    #[tracing::instrument(skip(self, new))]
    pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer, CheckoutError> {
        let customer = Customer::create(new)?;
        self.store.insert_customer(&customer).await?;
        Ok(customer)
    }

    /// Applies a partial update to a customer.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, CheckoutError> {
        let mut customer = self
            .store
            .customer(id)
            .await?
            .ok_or(StoreError::not_found("Customer"))?;
        customer.apply(patch)?;
        self.store.update_customer(&customer).await?;
        Ok(customer)
    }

    /// Removes a customer without orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), CheckoutError> {
        Ok(self.store.delete_customer(id).await?)
    }

    /// Point lookup of a customer.
    pub async fn customer(&self, id: CustomerId) -> Result<Customer, CheckoutError> {
        Ok(self
            .store
            .customer(id)
            .await?
            .ok_or(StoreError::not_found("Customer"))?)
    }

    /// All customers, most recently created first.
    pub async fn customers(&self) -> Result<Vec<Customer>, CheckoutError> {
        Ok(self.store.customers().await?)
    }
}
