//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one table, and returns record structs from
//! [`crate::db::models`]. The [`Repository`] trait defines the common CRUD
//! shape; repositories with bespoke operations (the credit ledger) add
//! methods alongside it.

pub mod generations;
pub mod repository;
pub mod users;

pub use generations::Generations;
pub use repository::Repository;
pub use users::Users;
