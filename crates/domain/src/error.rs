//! Domain validation errors.

use thiserror::Error;

/// Errors raised by input validation, before any transaction opens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An order draft was submitted without line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line item quantity was zero.
    #[error("Quantity must be positive")]
    InvalidQuantity,

    /// A price was zero or negative.
    #[error("Price must be positive")]
    InvalidPrice,

    /// A stock level was negative.
    #[error("Stock cannot be negative")]
    InvalidStock,

    /// A required name field was empty.
    #[error("{field} name is required")]
    MissingName { field: &'static str },

    /// An email address failed the format check.
    #[error("Invalid email format: {email}")]
    InvalidEmail { email: String },

    /// A payment proof URL was empty.
    #[error("Proof URL is required")]
    MissingProofUrl,
}
