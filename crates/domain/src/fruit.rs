//! Fruit catalog entities.

use chrono::{DateTime, Utc};
use common::{FruitId, Money};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Stock level at or below which a fruit counts as "low stock".
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// A product in the catalog.
///
/// Stock is never negative; the storage layer only decrements it through a
/// conditional update that refuses to go below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub id: FruitId,
    pub name: String,
    /// Current unit price. Orders capture their own copy of the price, so
    /// changing this never affects historical orders.
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fruit {
    /// Builds a new fruit from validated input, stamping id and timestamps.
    pub fn create(new: NewFruit) -> Result<Self, DomainError> {
        new.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: FruitId::new(),
            name: new.name,
            price: new.price,
            stock: new.stock,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update, refreshing `updated_at`.
    pub fn apply(&mut self, patch: FruitPatch) -> Result<(), DomainError> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns true if the fruit can still be ordered.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Input for creating a fruit.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFruit {
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
}

impl NewFruit {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingName { field: "Fruit" });
        }
        if !self.price.is_positive() {
            return Err(DomainError::InvalidPrice);
        }
        if self.stock < 0 {
            return Err(DomainError::InvalidStock);
        }
        Ok(())
    }
}

/// Partial update for a fruit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FruitPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
}

impl FruitPatch {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(DomainError::MissingName { field: "Fruit" });
        }
        if let Some(price) = self.price
            && !price.is_positive()
        {
            return Err(DomainError::InvalidPrice);
        }
        if let Some(stock) = self.stock
            && stock < 0
        {
            return Err(DomainError::InvalidStock);
        }
        Ok(())
    }
}

/// Aggregated catalog statistics for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FruitStats {
    pub total: i64,
    pub in_stock: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub total_units: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_fruit() -> NewFruit {
        NewFruit {
            name: "Mango".to_string(),
            price: Money::from_cents(1500),
            stock: 20,
            image_url: None,
        }
    }

    #[test]
    fn create_stamps_id_and_timestamps() {
        let fruit = Fruit::create(new_fruit()).unwrap();
        assert_eq!(fruit.name, "Mango");
        assert_eq!(fruit.created_at, fruit.updated_at);
        assert!(fruit.in_stock());
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut new = new_fruit();
        new.name = "  ".to_string();
        assert_eq!(
            Fruit::create(new).unwrap_err(),
            DomainError::MissingName { field: "Fruit" }
        );
    }

    #[test]
    fn create_rejects_non_positive_price() {
        let mut new = new_fruit();
        new.price = Money::zero();
        assert_eq!(Fruit::create(new).unwrap_err(), DomainError::InvalidPrice);
    }

    #[test]
    fn create_rejects_negative_stock() {
        let mut new = new_fruit();
        new.stock = -1;
        assert_eq!(Fruit::create(new).unwrap_err(), DomainError::InvalidStock);
    }

    #[test]
    fn apply_updates_only_provided_fields() {
        let mut fruit = Fruit::create(new_fruit()).unwrap();
        fruit
            .apply(FruitPatch {
                price: Some(Money::from_cents(1800)),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(fruit.price.cents(), 1800);
        assert_eq!(fruit.name, "Mango");
        assert_eq!(fruit.stock, 20);
    }

    #[test]
    fn apply_rejects_invalid_patch() {
        let mut fruit = Fruit::create(new_fruit()).unwrap();
        let err = fruit
            .apply(FruitPatch {
                stock: Some(-5),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidStock);
    }
}
