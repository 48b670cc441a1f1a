//! Orders, line items, and the order status state machine.

use chrono::{DateTime, Utc};
use common::{CustomerId, FruitId, Money, OrderId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::payment::{Payment, PaymentMethod};

/// Lifecycle status of an order.
///
/// The only legal transitions are Processing -> Completed and
/// Processing -> Cancelled; both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }

    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROCESSING" => Some(OrderStatus::Processing),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable unique order number, e.g. `ORD-1724917423000-9f3ab21c`.
    pub order_number: String,
    pub customer_id: CustomerId,
    /// Back-office user who placed the order on the customer's behalf, if any.
    pub user_id: Option<UserId>,
    pub payment_method: PaymentMethod,
    /// Sum of line item subtotals, captured at creation and never recomputed.
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds the order row for a validated draft.
    pub fn from_draft(draft: &OrderDraft, order_number: String) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number,
            customer_id: draft.customer_id,
            user_id: draft.user_id,
            payment_method: draft.payment_method,
            total: draft.total(),
            status: OrderStatus::Processing,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A line item belonging to exactly one order.
///
/// The unit price is the price the caller saw at add-to-cart time, not the
/// fruit's live price; it is immutable after creation so historical orders
/// survive future price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub fruit_id: FruitId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Generates a practically-unique order number.
///
/// Timestamp plus a random suffix. Collisions are negligible but not
/// impossible; creation retries with a fresh number if the unique constraint
/// fires.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{millis}-{}", &suffix[..8])
}

/// A validated cart ready to be placed as an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    pub user_id: Option<UserId>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<OrderLine>,
}

impl OrderDraft {
    /// Checks the preconditions that must hold before any transaction opens:
    /// at least one line, every quantity and price positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        for line in &self.lines {
            if line.quantity == 0 {
                return Err(DomainError::InvalidQuantity);
            }
            if !line.unit_price.is_positive() {
                return Err(DomainError::InvalidPrice);
            }
        }
        Ok(())
    }

    /// Order total from the caller-supplied prices.
    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// One cart line: a fruit, a quantity, and the unit price captured by the
/// caller.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub fruit_id: FruitId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    /// quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order together with its line items and payment records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
}

/// Aggregate order figures for the dashboard.
///
/// The time-windowed buckets count orders created since UTC midnight and
/// since the first of the current UTC month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub total_count: i64,
    pub total_amount: Money,
    pub today_count: i64,
    pub today_amount: Money,
    pub this_month_count: i64,
    pub this_month_amount: Money,
    pub processing: i64,
    pub completed: i64,
    pub cancelled: i64,
}
