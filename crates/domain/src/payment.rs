//! Payment records and their state machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    CreditCard,
    DigitalWallet,
}

impl PaymentMethod {
    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DigitalWallet => "DIGITAL_WALLET",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMethod::Cash),
            "TRANSFER" => Some(PaymentMethod::Transfer),
            "CREDIT_CARD" => Some(PaymentMethod::CreditCard),
            "DIGITAL_WALLET" => Some(PaymentMethod::DigitalWallet),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a payment. Failed is the only terminal non-success state, which
/// is why cancellation marks payments Failed rather than inventing a
/// "cancelled" status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment attempt for an order. One pending record is created
/// automatically with the order; proof of payment arrives later,
/// out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub proof_url: Option<String>,
}

impl Payment {
    /// The pending payment created alongside a new order, covering its full
    /// total.
    pub fn pending(order_id: OrderId, amount: Money, method: PaymentMethod) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            amount,
            status: PaymentStatus::Pending,
            method,
            paid_at: Utc::now(),
            proof_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_roundtrip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Transfer,
            PaymentMethod::CreditCard,
            PaymentMethod::DigitalWallet,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("BARTER"), None);
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn pending_payment_covers_full_amount() {
        let order_id = OrderId::new();
        let payment = Payment::pending(order_id, Money::from_cents(3000), PaymentMethod::Cash);

        assert_eq!(payment.order_id, order_id);
        assert_eq!(payment.amount.cents(), 3000);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.proof_url.is_none());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::DigitalWallet).unwrap();
        assert_eq!(json, "\"DIGITAL_WALLET\"");
        let json = serde_json::to_string(&PaymentStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }
}
