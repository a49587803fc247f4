//! User account repository and the credit ledger.
//!
//! The ledger is a single `credits` column per user. The charge gate is
//! [`Users::debit_credit`]: a conditional UPDATE that only matches while the
//! balance is positive, so two concurrent generations can both attempt the
//! debit but only as many succeed as there are credits. The balance can never
//! go negative (also enforced by a CHECK constraint).

use crate::db::{
    errors::{DbError, Result},
    models::users::{DebitOutcome, UserCreateDBRequest, UserDBResponse},
};
use sqlx::PgConnection;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a new user account with its starting credit balance.
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "INSERT INTO users (email, display_name, credits)
             VALUES ($1, $2, $3)
             RETURNING id, email, display_name, credits, created_at, updated_at",
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.credits)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, email, display_name, credits, created_at, updated_at
             FROM users
             WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    /// Idempotent provisioning: returns the existing account or creates one
    /// with the configured starting balance. The bool is true when a new row
    /// was inserted.
    pub async fn get_or_create(&mut self, request: &UserCreateDBRequest) -> Result<(UserDBResponse, bool)> {
        let inserted = sqlx::query_as::<_, UserDBResponse>(
            "INSERT INTO users (email, display_name, credits)
             VALUES ($1, $2, $3)
             ON CONFLICT (email) DO NOTHING
             RETURNING id, email, display_name, credits, created_at, updated_at",
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.credits)
        .fetch_optional(&mut *self.db)
        .await?;

        if let Some(user) = inserted {
            return Ok((user, true));
        }

        // Lost the insert race or the account already existed.
        match self.get_by_email(&request.email).await? {
            Some(user) => Ok((user, false)),
            None => Err(DbError::NotFound),
        }
    }

    /// Current balance, or None for an unknown account.
    pub async fn get_credits(&mut self, email: &str) -> Result<Option<i32>> {
        let credits = sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(credits)
    }

    /// Atomically take one credit if the balance allows it.
    ///
    /// The `credits > 0` predicate and the decrement execute as one
    /// statement, so concurrent callers serialize on the row and at most
    /// `balance` of them succeed.
    pub async fn debit_credit(&mut self, email: &str) -> Result<DebitOutcome> {
        let remaining = sqlx::query_scalar::<_, i32>(
            "UPDATE users
             SET credits = credits - 1, updated_at = now()
             WHERE email = $1 AND credits > 0
             RETURNING credits",
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(DebitOutcome::Debited { remaining });
        }

        // Nothing matched: distinguish an exhausted balance from a user that
        // was never provisioned.
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut *self.db)
            .await?;

        if exists {
            Ok(DebitOutcome::InsufficientCredits)
        } else {
            Ok(DebitOutcome::NoSuchUser)
        }
    }

    /// Add credits to an account (admin top-up). Returns the new balance.
    pub async fn grant_credits(&mut self, email: &str, amount: i32) -> Result<i32> {
        let balance = sqlx::query_scalar::<_, i32>(
            "UPDATE users
             SET credits = credits + $2, updated_at = now()
             WHERE email = $1
             RETURNING credits",
        )
        .bind(email)
        .bind(amount)
        .fetch_optional(&mut *self.db)
        .await?;

        balance.ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn request(email: &str, credits: i32) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            display_name: None,
            credits,
        }
    }

    #[sqlx::test]
    async fn provisioning_is_idempotent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let (first, created) = users.get_or_create(&request("a@example.com", 3)).await.unwrap();
        assert!(created);
        assert_eq!(first.credits, 3);

        // A second provisioning call must not reset the balance.
        users.debit_credit("a@example.com").await.unwrap();
        let (again, created) = users.get_or_create(&request("a@example.com", 3)).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.credits, 2);
    }

    #[sqlx::test]
    async fn debit_stops_at_zero(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        users.create(&request("b@example.com", 1)).await.unwrap();

        let first = users.debit_credit("b@example.com").await.unwrap();
        assert_eq!(first, DebitOutcome::Debited { remaining: 0 });

        // Second debit observes the drained balance and refuses.
        let second = users.debit_credit("b@example.com").await.unwrap();
        assert_eq!(second, DebitOutcome::InsufficientCredits);
        assert_eq!(users.get_credits("b@example.com").await.unwrap(), Some(0));
    }

    #[sqlx::test]
    async fn debit_unknown_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        let outcome = users.debit_credit("ghost@example.com").await.unwrap();
        assert_eq!(outcome, DebitOutcome::NoSuchUser);
    }

    #[sqlx::test]
    async fn grant_tops_up_balance(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        users.create(&request("c@example.com", 0)).await.unwrap();

        assert_eq!(users.grant_credits("c@example.com", 5).await.unwrap(), 5);
        assert!(matches!(
            users.grant_credits("missing@example.com", 5).await,
            Err(DbError::NotFound)
        ));
    }
}
