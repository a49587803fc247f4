//! Database layer for data persistence and access.
//!
//! Implements the data access layer using SQLx with PostgreSQL, following the
//! repository pattern: API handlers talk to repositories
//! ([`handlers`]), repositories execute queries and return record structs
//! ([`models`]), and errors are categorized in [`errors`].
//!
//! Repositories wrap a `&mut PgConnection` so callers decide the transaction
//! scope. Mutating flows (persist + charge) always run inside a transaction
//! begun at the call site:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut users = Users::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! Migrations live in `migrations/` and are applied on startup via
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
