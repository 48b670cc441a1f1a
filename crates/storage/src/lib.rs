//! Persistence layer for the fruit store.
//!
//! The [`Store`] trait is the persistence collaborator the rest of the system
//! talks to: point reads plus [`Store::begin`], which opens a [`StoreTx`]
//! unit of work whose writes commit all-or-nothing. Two backends implement
//! it: [`MemoryStore`] for tests and [`PgStore`] over PostgreSQL.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Store, StoreTx};
