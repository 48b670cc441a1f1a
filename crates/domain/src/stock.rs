//! Append-only stock movement log.

use chrono::{DateTime, Utc};
use common::FruitId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    /// Database representation (`"in"` / `"out"`).
    pub fn as_str(self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementDirection::In),
            "out" => Some(MovementDirection::Out),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the stock audit log. Entries are only ever appended: "out"
/// when an order consumes stock, "in" when a cancellation restores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub fruit_id: FruitId,
    pub quantity: u32,
    pub direction: MovementDirection,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Records stock leaving inventory.
    pub fn outgoing(fruit_id: FruitId, quantity: u32, description: String) -> Self {
        Self::record(fruit_id, quantity, MovementDirection::Out, description)
    }

    /// Records stock returning to inventory.
    pub fn incoming(fruit_id: FruitId, quantity: u32, description: String) -> Self {
        Self::record(fruit_id, quantity, MovementDirection::In, description)
    }

    fn record(
        fruit_id: FruitId,
        quantity: u32,
        direction: MovementDirection,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fruit_id,
            quantity,
            direction,
            description,
            created_at: Utc::now(),
        }
    }
}
