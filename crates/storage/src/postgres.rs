//! PostgreSQL-backed store implementation.

use async_trait::async_trait;
use common::{CustomerId, FruitId, Money, OrderId, PaymentId, UserId};
use domain::fruit::LOW_STOCK_THRESHOLD;
use domain::{
    Customer, Fruit, FruitStats, MovementDirection, Order, OrderDetails, OrderItem, OrderStatus,
    OrderSummary, Payment, PaymentMethod, PaymentStatus, StockMovement,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::{Store, StoreTx};

/// PostgreSQL [`Store`] backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        tracing::debug!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

fn row_to_fruit(row: PgRow) -> Result<Fruit> {
    Ok(Fruit {
        id: FruitId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: row.try_get("stock")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_customer(row: PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let status_raw: String = row.try_get("status")?;
    let status = OrderStatus::parse(&status_raw).ok_or(StoreError::Decode {
        column: "status",
        value: status_raw,
    })?;
    let method_raw: String = row.try_get("payment_method")?;
    let payment_method = PaymentMethod::parse(&method_raw).ok_or(StoreError::Decode {
        column: "payment_method",
        value: method_raw,
    })?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_number: row.try_get("order_number")?,
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        user_id: row
            .try_get::<Option<Uuid>, _>("user_id")?
            .map(UserId::from_uuid),
        payment_method,
        total: Money::from_cents(row.try_get("total_cents")?),
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
    let quantity_raw: i64 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity_raw).map_err(|_| StoreError::Decode {
        column: "quantity",
        value: quantity_raw.to_string(),
    })?;

    Ok(OrderItem {
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        fruit_id: FruitId::from_uuid(row.try_get::<Uuid, _>("fruit_id")?),
        quantity,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    let status_raw: String = row.try_get("status")?;
    let status = PaymentStatus::parse(&status_raw).ok_or(StoreError::Decode {
        column: "status",
        value: status_raw,
    })?;
    let method_raw: String = row.try_get("payment_method")?;
    let method = PaymentMethod::parse(&method_raw).ok_or(StoreError::Decode {
        column: "payment_method",
        value: method_raw,
    })?;

    Ok(Payment {
        id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        amount: Money::from_cents(row.try_get("amount_cents")?),
        status,
        method,
        paid_at: row.try_get("paid_at")?,
        proof_url: row.try_get("proof_url")?,
    })
}

fn row_to_movement(row: PgRow) -> Result<StockMovement> {
    let direction_raw: String = row.try_get("direction")?;
    let direction = MovementDirection::parse(&direction_raw).ok_or(StoreError::Decode {
        column: "direction",
        value: direction_raw,
    })?;
    let quantity_raw: i64 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity_raw).map_err(|_| StoreError::Decode {
        column: "quantity",
        value: quantity_raw.to_string(),
    })?;

    Ok(StockMovement {
        id: row.try_get("id")?,
        fruit_id: FruitId::from_uuid(row.try_get::<Uuid, _>("fruit_id")?),
        quantity,
        direction,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn fruit(&self, id: FruitId) -> Result<Option<Fruit>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, stock, image_url, created_at, updated_at \
             FROM fruits WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_fruit).transpose()
    }

    async fn fruits(&self) -> Result<Vec<Fruit>> {
        let rows = sqlx::query(
            "SELECT id, name, price_cents, stock, image_url, created_at, updated_at \
             FROM fruits ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_fruit).collect()
    }

    async fn fruits_in_stock(&self) -> Result<Vec<Fruit>> {
        let rows = sqlx::query(
            "SELECT id, name, price_cents, stock, image_url, created_at, updated_at \
             FROM fruits WHERE stock > 0 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_fruit).collect()
    }

    async fn insert_fruit(&self, fruit: &Fruit) -> Result<()> {
        sqlx::query(
            "INSERT INTO fruits (id, name, price_cents, stock, image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(fruit.id.as_uuid())
        .bind(&fruit.name)
        .bind(fruit.price.cents())
        .bind(fruit.stock)
        .bind(&fruit.image_url)
        .bind(fruit.created_at)
        .bind(fruit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_fruit(&self, fruit: &Fruit) -> Result<()> {
        let result = sqlx::query(
            "UPDATE fruits SET name = $2, price_cents = $3, stock = $4, image_url = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(fruit.id.as_uuid())
        .bind(&fruit.name)
        .bind(fruit.price.cents())
        .bind(fruit.stock)
        .bind(&fruit.image_url)
        .bind(fruit.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Fruit"));
        }
        Ok(())
    }

    async fn delete_fruit(&self, id: FruitId) -> Result<()> {
        let ordered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE fruit_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        if ordered > 0 {
            return Err(StoreError::Conflict(
                "Cannot delete a fruit that has been ordered",
            ));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stock_movements WHERE fruit_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM fruits WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Fruit"));
        }
        Ok(())
    }

    async fn fruit_stats(&self) -> Result<FruitStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE stock > 0) AS in_stock, \
                    COUNT(*) FILTER (WHERE stock > 0 AND stock <= $1) AS low_stock, \
                    COUNT(*) FILTER (WHERE stock = 0) AS out_of_stock, \
                    COALESCE(SUM(stock), 0)::BIGINT AS total_units \
             FROM fruits",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.pool)
        .await?;

        Ok(FruitStats {
            total: row.try_get("total")?,
            in_stock: row.try_get("in_stock")?,
            low_stock: row.try_get("low_stock")?,
            out_of_stock: row.try_get("out_of_stock")?,
            total_units: row.try_get("total_units")?,
        })
    }

    async fn stock_movements(&self, fruit_id: FruitId, limit: i64) -> Result<Vec<StockMovement>> {
        let rows = sqlx::query(
            "SELECT id, fruit_id, quantity, direction, description, created_at \
             FROM stock_movements WHERE fruit_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(fruit_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_movement).collect()
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, created_at FROM customers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_customer).transpose()
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, address, created_at \
             FROM customers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_customer).collect()
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, address, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "customers_email_key") {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        let result = sqlx::query(
            "UPDATE customers SET name = $2, email = $3, phone = $4, address = $5 WHERE id = $1",
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "customers_email_key") {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer"));
        }
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        if orders > 0 {
            return Err(StoreError::Conflict(
                "Cannot delete a customer with existing orders",
            ));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer"));
        }
        Ok(())
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        let order_row = sqlx::query(
            "SELECT id, order_number, customer_id, user_id, payment_method, total_cents, \
                    status, created_at, updated_at \
             FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(order_row) = order_row else {
            return Ok(None);
        };
        let order = row_to_order(order_row)?;

        let item_rows = sqlx::query(
            "SELECT order_id, fruit_id, quantity, unit_price_cents, subtotal_cents \
             FROM order_items WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows
            .into_iter()
            .map(row_to_order_item)
            .collect::<Result<Vec<_>>>()?;

        let payment_rows = sqlx::query(
            "SELECT id, order_id, amount_cents, status, payment_method, paid_at, proof_url \
             FROM payments WHERE order_id = $1 ORDER BY paid_at ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let payments = payment_rows
            .into_iter()
            .map(row_to_payment)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderDetails {
            order,
            items,
            payments,
        }))
    }

    async fn orders(&self, limit: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, order_number, customer_id, user_id, payment_method, total_cents, \
                    status, created_at, updated_at \
             FROM orders ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn order_summary(&self) -> Result<OrderSummary> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total_count, \
                    COALESCE(SUM(total_cents), 0)::BIGINT AS total_amount, \
                    COUNT(*) FILTER (WHERE created_at >= date_trunc('day', now())) AS today_count, \
                    COALESCE(SUM(total_cents) FILTER (WHERE created_at >= date_trunc('day', now())), 0)::BIGINT AS today_amount, \
                    COUNT(*) FILTER (WHERE created_at >= date_trunc('month', now())) AS this_month_count, \
                    COALESCE(SUM(total_cents) FILTER (WHERE created_at >= date_trunc('month', now())), 0)::BIGINT AS this_month_amount, \
                    COUNT(*) FILTER (WHERE status = 'PROCESSING') AS processing, \
                    COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed, \
                    COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled \
             FROM orders",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderSummary {
            total_count: row.try_get("total_count")?,
            total_amount: Money::from_cents(row.try_get("total_amount")?),
            today_count: row.try_get("today_count")?,
            today_amount: Money::from_cents(row.try_get("today_amount")?),
            this_month_count: row.try_get("this_month_count")?,
            this_month_amount: Money::from_cents(row.try_get("this_month_amount")?),
            processing: row.try_get("processing")?,
            completed: row.try_get("completed")?,
            cancelled: row.try_get("cancelled")?,
        })
    }

    async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        proof_url: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "UPDATE payments SET proof_url = $2 \
             WHERE order_id = $1 AND status = 'PENDING' \
             RETURNING id, order_id, amount_cents, status, payment_method, paid_at, proof_url",
        )
        .bind(order_id.as_uuid())
        .bind(proof_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_payment).transpose()
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn fruit(&mut self, id: FruitId) -> Result<Option<Fruit>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, stock, image_url, created_at, updated_at \
             FROM fruits WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_fruit).transpose()
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_id, user_id, payment_method, \
                                 total_cents, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.customer_id.as_uuid())
        .bind(order.user_id.map(|u| u.as_uuid()))
        .bind(order.payment_method.as_str())
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "orders_order_number_key") {
                StoreError::DuplicateOrderNumber(order.order_number.clone())
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO order_items (order_id, fruit_id, quantity, unit_price_cents, subtotal_cents) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(item.order_id.as_uuid())
        .bind(item.fruit_id.as_uuid())
        .bind(i64::from(item.quantity))
        .bind(item.unit_price.cents())
        .bind(item.subtotal.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn deduct_stock(&mut self, id: FruitId, quantity: u32) -> Result<bool> {
        // The WHERE clause makes the decrement conditional: zero affected
        // rows means insufficient stock (or no such fruit), and nothing
        // changed.
        let result = sqlx::query(
            "UPDATE fruits SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn restore_stock(&mut self, id: FruitId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE fruits SET stock = stock + $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Fruit"));
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<()> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, amount_cents, status, payment_method, \
                                   paid_at, proof_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.amount.cents())
        .bind(payment.status.as_str())
        .bind(payment.method.as_str())
        .bind(payment.paid_at)
        .bind(&payment.proof_url)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_stock_movement(&mut self, movement: &StockMovement) -> Result<()> {
        sqlx::query(
            "INSERT INTO stock_movements (id, fruit_id, quantity, direction, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(movement.id)
        .bind(movement.fruit_id.as_uuid())
        .bind(i64::from(movement.quantity))
        .bind(movement.direction.as_str())
        .bind(&movement.description)
        .bind(movement.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn order_with_items(&mut self, id: OrderId) -> Result<Option<(Order, Vec<OrderItem>)>> {
        let order_row = sqlx::query(
            "SELECT id, order_number, customer_id, user_id, payment_method, total_cents, \
                    status, created_at, updated_at \
             FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(order_row) = order_row else {
            return Ok(None);
        };
        let order = row_to_order(order_row)?;

        let item_rows = sqlx::query(
            "SELECT order_id, fruit_id, quantity, unit_price_cents, subtotal_cents \
             FROM order_items WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        let items = item_rows
            .into_iter()
            .map(row_to_order_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some((order, items)))
    }

    async fn mark_payments_failed(&mut self, order_id: OrderId) -> Result<u64> {
        let result = sqlx::query("UPDATE payments SET status = 'FAILED' WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>> {
        // The status predicate makes the transition a conditional write, the
        // same way deduct_stock guards against concurrent decrements. A
        // racing transaction that already moved the order matches zero rows.
        let row = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 \
             RETURNING id, order_number, customer_id, user_id, payment_method, total_cents, \
                       status, created_at, updated_at",
        )
        .bind(order_id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_order).transpose()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
