//! Storage error types.

use thiserror::Error;

/// Convenience result alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The generated order number collided with an existing one; the caller
    /// retries with a fresh number.
    #[error("Order number {0} already exists")]
    DuplicateOrderNumber(String),

    /// A customer with the given email already exists.
    #[error("Customer with this email already exists")]
    DuplicateEmail,

    /// The operation would break referential integrity.
    #[error("{0}")]
    Conflict(&'static str),

    /// A stored value could not be decoded into its domain representation.
    #[error("Invalid {column} value in database: {value}")]
    Decode { column: &'static str, value: String },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Shorthand for a typed not-found error.
    pub fn not_found(entity: &'static str) -> Self {
        StoreError::NotFound { entity }
    }
}
