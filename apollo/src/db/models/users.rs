//! Database models for user accounts and their credit balances.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub display_name: Option<String>,
    /// Starting credit balance granted at provisioning time.
    pub credits: i32,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub credits: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of the atomic credit debit.
///
/// `InsufficientCredits` covers both a zero balance and an unknown account:
/// the charge gate treats them identically (a user that was never provisioned
/// has nothing to spend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Debited { remaining: i32 },
    InsufficientCredits,
    NoSuchUser,
}
