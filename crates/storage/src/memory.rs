//! In-memory store implementation for testing.
//!
//! Transactions stage their writes against a clone of the state and commit
//! by swapping it back in, so a dropped transaction leaves nothing behind.
//! A tokio mutex serializes transactions; reads outside a transaction take
//! the same lock briefly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveTime, Utc};
use common::{CustomerId, FruitId, OrderId};
use domain::fruit::LOW_STOCK_THRESHOLD;
use domain::{
    Customer, Fruit, FruitStats, Money, Order, OrderDetails, OrderItem, OrderStatus, OrderSummary,
    Payment, PaymentStatus, StockMovement,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Result, StoreError};
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
struct State {
    fruits: HashMap<FruitId, Fruit>,
    customers: HashMap<CustomerId, Customer>,
    orders: HashMap<OrderId, Order>,
    order_items: Vec<OrderItem>,
    payments: Vec<Payment>,
    movements: Vec<StockMovement>,
}

impl State {
    fn insert_fruit(&mut self, fruit: &Fruit) {
        self.fruits.insert(fruit.id, fruit.clone());
    }

    fn update_fruit(&mut self, fruit: &Fruit) -> Result<()> {
        match self.fruits.get_mut(&fruit.id) {
            Some(existing) => {
                *existing = fruit.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("Fruit")),
        }
    }

    fn delete_fruit(&mut self, id: FruitId) -> Result<()> {
        if self.order_items.iter().any(|i| i.fruit_id == id) {
            return Err(StoreError::Conflict(
                "Cannot delete a fruit that has been ordered",
            ));
        }
        if self.fruits.remove(&id).is_none() {
            return Err(StoreError::not_found("Fruit"));
        }
        self.movements.retain(|m| m.fruit_id != id);
        Ok(())
    }

    fn fruit_stats(&self) -> FruitStats {
        let mut stats = FruitStats {
            total: 0,
            in_stock: 0,
            low_stock: 0,
            out_of_stock: 0,
            total_units: 0,
        };
        for fruit in self.fruits.values() {
            stats.total += 1;
            stats.total_units += fruit.stock;
            if fruit.stock == 0 {
                stats.out_of_stock += 1;
            } else {
                stats.in_stock += 1;
                if fruit.stock <= LOW_STOCK_THRESHOLD {
                    stats.low_stock += 1;
                }
            }
        }
        stats
    }

    fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        self.check_email_free(customer.email.as_deref(), None)?;
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    fn update_customer(&mut self, customer: &Customer) -> Result<()> {
        if !self.customers.contains_key(&customer.id) {
            return Err(StoreError::not_found("Customer"));
        }
        self.check_email_free(customer.email.as_deref(), Some(customer.id))?;
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    fn check_email_free(&self, email: Option<&str>, except: Option<CustomerId>) -> Result<()> {
        let Some(email) = email else { return Ok(()) };
        let taken = self
            .customers
            .values()
            .any(|c| Some(c.id) != except && c.email.as_deref() == Some(email));
        if taken {
            Err(StoreError::DuplicateEmail)
        } else {
            Ok(())
        }
    }

    fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        if self.orders.values().any(|o| o.customer_id == id) {
            return Err(StoreError::Conflict(
                "Cannot delete a customer with existing orders",
            ));
        }
        if self.customers.remove(&id).is_none() {
            return Err(StoreError::not_found("Customer"));
        }
        Ok(())
    }

    fn items_for(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect()
    }

    fn order_details(&self, id: OrderId) -> Option<OrderDetails> {
        let order = self.orders.get(&id)?.clone();
        let items = self.items_for(id);
        let payments = self
            .payments
            .iter()
            .filter(|p| p.order_id == id)
            .cloned()
            .collect();
        Some(OrderDetails {
            order,
            items,
            payments,
        })
    }

    fn order_summary(&self) -> OrderSummary {
        let today = Utc::now().date_naive();
        let day_start = today.and_time(NaiveTime::MIN).and_utc();
        let month_start = today
            .with_day(1)
            .unwrap_or(today)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let mut summary = OrderSummary {
            total_count: 0,
            total_amount: Money::zero(),
            today_count: 0,
            today_amount: Money::zero(),
            this_month_count: 0,
            this_month_amount: Money::zero(),
            processing: 0,
            completed: 0,
            cancelled: 0,
        };
        for order in self.orders.values() {
            summary.total_count += 1;
            summary.total_amount += order.total;
            if order.created_at >= day_start {
                summary.today_count += 1;
                summary.today_amount += order.total;
            }
            if order.created_at >= month_start {
                summary.this_month_count += 1;
                summary.this_month_amount += order.total;
            }
            match order.status {
                OrderStatus::Processing => summary.processing += 1,
                OrderStatus::Completed => summary.completed += 1,
                OrderStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }

    fn insert_order(&mut self, order: &Order) -> Result<()> {
        if self
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn deduct_stock(&mut self, id: FruitId, quantity: u32) -> Result<bool> {
        let Some(fruit) = self.fruits.get_mut(&id) else {
            return Ok(false);
        };
        if fruit.stock < i64::from(quantity) {
            return Ok(false);
        }
        fruit.stock -= i64::from(quantity);
        fruit.updated_at = Utc::now();
        Ok(true)
    }

    fn restore_stock(&mut self, id: FruitId, quantity: u32) -> Result<()> {
        let fruit = self
            .fruits
            .get_mut(&id)
            .ok_or(StoreError::not_found("Fruit"))?;
        fruit.stock += i64::from(quantity);
        fruit.updated_at = Utc::now();
        Ok(())
    }

    fn mark_payments_failed(&mut self, order_id: OrderId) -> u64 {
        let mut changed = 0;
        for payment in self.payments.iter_mut().filter(|p| p.order_id == order_id) {
            payment.status = PaymentStatus::Failed;
            changed += 1;
        }
        changed
    }

    fn set_order_status(
        &mut self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Option<Order> {
        let order = self.orders.get_mut(&order_id)?;
        if order.status != from {
            return None;
        }
        order.status = to;
        order.updated_at = Utc::now();
        Some(order.clone())
    }
}

/// In-memory [`Store`] backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stock movement entries, for test assertions.
    pub async fn movement_count(&self) -> usize {
        self.state.lock().await.movements.len()
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn fruit(&self, id: FruitId) -> Result<Option<Fruit>> {
        Ok(self.state.lock().await.fruits.get(&id).cloned())
    }

    async fn fruits(&self) -> Result<Vec<Fruit>> {
        let state = self.state.lock().await;
        let mut fruits: Vec<_> = state.fruits.values().cloned().collect();
        fruits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(fruits)
    }

    async fn fruits_in_stock(&self) -> Result<Vec<Fruit>> {
        let state = self.state.lock().await;
        let mut fruits: Vec<_> = state
            .fruits
            .values()
            .filter(|f| f.in_stock())
            .cloned()
            .collect();
        fruits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fruits)
    }

    async fn insert_fruit(&self, fruit: &Fruit) -> Result<()> {
        self.state.lock().await.insert_fruit(fruit);
        Ok(())
    }

    async fn update_fruit(&self, fruit: &Fruit) -> Result<()> {
        self.state.lock().await.update_fruit(fruit)
    }

    async fn delete_fruit(&self, id: FruitId) -> Result<()> {
        self.state.lock().await.delete_fruit(id)
    }

    async fn fruit_stats(&self) -> Result<FruitStats> {
        Ok(self.state.lock().await.fruit_stats())
    }

    async fn stock_movements(&self, fruit_id: FruitId, limit: i64) -> Result<Vec<StockMovement>> {
        let state = self.state.lock().await;
        let mut movements: Vec<_> = state
            .movements
            .iter()
            .filter(|m| m.fruit_id == fruit_id)
            .cloned()
            .collect();
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        movements.truncate(limit.max(0) as usize);
        Ok(movements)
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.state.lock().await.customers.get(&id).cloned())
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        let state = self.state.lock().await;
        let mut customers: Vec<_> = state.customers.values().cloned().collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.state.lock().await.insert_customer(customer)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        self.state.lock().await.update_customer(customer)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        self.state.lock().await.delete_customer(id)
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        Ok(self.state.lock().await.order_details(id))
    }

    async fn orders(&self, limit: i64) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit.max(0) as usize);
        Ok(orders)
    }

    async fn order_summary(&self) -> Result<OrderSummary> {
        Ok(self.state.lock().await.order_summary())
    }

    async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Payment>> {
        let mut state = self.state.lock().await;
        let payment = state
            .payments
            .iter_mut()
            .find(|p| p.order_id == order_id && p.status == PaymentStatus::Pending);
        Ok(payment.map(|p| {
            p.proof_url = Some(proof_url.to_string());
            p.clone()
        }))
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn fruit(&mut self, id: FruitId) -> Result<Option<Fruit>> {
        Ok(self.staged.fruits.get(&id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.staged.insert_order(order)
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        self.staged.order_items.push(item.clone());
        Ok(())
    }

    async fn deduct_stock(&mut self, id: FruitId, quantity: u32) -> Result<bool> {
        self.staged.deduct_stock(id, quantity)
    }

    async fn restore_stock(&mut self, id: FruitId, quantity: u32) -> Result<()> {
        self.staged.restore_stock(id, quantity)
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<()> {
        self.staged.payments.push(payment.clone());
        Ok(())
    }

    async fn insert_stock_movement(&mut self, movement: &StockMovement) -> Result<()> {
        self.staged.movements.push(movement.clone());
        Ok(())
    }

    async fn order_with_items(&mut self, id: OrderId) -> Result<Option<(Order, Vec<OrderItem>)>> {
        let Some(order) = self.staged.orders.get(&id).cloned() else {
            return Ok(None);
        };
        let items = self.staged.items_for(id);
        Ok(Some((order, items)))
    }

    async fn mark_payments_failed(&mut self, order_id: OrderId) -> Result<u64> {
        Ok(self.staged.mark_payments_failed(order_id))
    }

    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>> {
        Ok(self.staged.set_order_status(order_id, from, to))
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }
}
