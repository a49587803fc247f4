//! Generation record repository.
//!
//! Records are ordered newest-first by the serial `id`; the client-supplied
//! `uid` is only a correlation key. Lookups by uid return the earliest
//! matching row, and updates/deletes by uid touch every matching row, since
//! uniqueness of the uid is not enforced at this layer.

use crate::db::{
    errors::{DbError, Result},
    models::generations::{GenerationCreateDBRequest, GenerationDBResponse},
};
use crate::db::handlers::repository::Repository;
use sqlx::PgConnection;

const GENERATION_COLUMNS: &str = "id, uid, description, image_url, model, code, created_by, created_at";

/// Filter for listing generation records
#[derive(Debug, Clone)]
pub struct GenerationFilter {
    pub created_by: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl GenerationFilter {
    pub fn by_owner(email: &str) -> Self {
        Self {
            created_by: Some(email.to_string()),
            skip: 0,
            limit: 1000,
        }
    }
}

/// Update request replacing the generated code in place.
#[derive(Debug, Clone)]
pub struct GenerationUpdateDBRequest {
    pub code: String,
}

pub struct Generations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Generations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// List a user's records, newest first.
    pub async fn list_by_owner(&mut self, email: &str) -> Result<Vec<GenerationDBResponse>> {
        self.list(&GenerationFilter::by_owner(email)).await
    }

    /// Replace the `code` field of the record(s) with this uid.
    /// Returns the uid when at least one row was updated.
    pub async fn update_code(&mut self, uid: &str, code: &str) -> Result<Option<String>> {
        let updated = sqlx::query_scalar::<_, String>(
            "UPDATE generations SET code = $2 WHERE uid = $1 RETURNING uid",
        )
        .bind(uid)
        .bind(code)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(updated)
    }
}

#[async_trait::async_trait]
impl Repository for Generations<'_> {
    type CreateRequest = GenerationCreateDBRequest;
    type UpdateRequest = GenerationUpdateDBRequest;
    type Response = GenerationDBResponse;
    type Id = String;
    type Filter = GenerationFilter;

    async fn create(&mut self, request: &GenerationCreateDBRequest) -> Result<GenerationDBResponse> {
        let record = sqlx::query_as::<_, GenerationDBResponse>(&format!(
            "INSERT INTO generations (uid, description, image_url, model, code, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {GENERATION_COLUMNS}"
        ))
        .bind(&request.uid)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(&request.model)
        .bind(&request.code)
        .bind(&request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    async fn get_by_id(&mut self, uid: String) -> Result<Option<GenerationDBResponse>> {
        let record = sqlx::query_as::<_, GenerationDBResponse>(&format!(
            "SELECT {GENERATION_COLUMNS}
             FROM generations
             WHERE uid = $1
             ORDER BY id
             LIMIT 1"
        ))
        .bind(uid)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(record)
    }

    async fn list(&mut self, filter: &GenerationFilter) -> Result<Vec<GenerationDBResponse>> {
        let records = sqlx::query_as::<_, GenerationDBResponse>(&format!(
            "SELECT {GENERATION_COLUMNS}
             FROM generations
             WHERE ($1::text IS NULL OR created_by = $1)
             ORDER BY id DESC
             OFFSET $2
             LIMIT $3"
        ))
        .bind(&filter.created_by)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }

    async fn update(&mut self, uid: String, request: &GenerationUpdateDBRequest) -> Result<GenerationDBResponse> {
        let record = sqlx::query_as::<_, GenerationDBResponse>(&format!(
            "UPDATE generations SET code = $2 WHERE uid = $1 RETURNING {GENERATION_COLUMNS}"
        ))
        .bind(uid)
        .bind(&request.code)
        .fetch_optional(&mut *self.db)
        .await?;

        record.ok_or(DbError::NotFound)
    }

    async fn delete(&mut self, uid: String) -> Result<bool> {
        let result = sqlx::query("DELETE FROM generations WHERE uid = $1")
            .bind(uid)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_user(pool: &PgPool, email: &str) {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                display_name: None,
                credits: 10,
            })
            .await
            .unwrap();
    }

    fn record(uid: &str, email: &str) -> GenerationCreateDBRequest {
        GenerationCreateDBRequest {
            uid: uid.to_string(),
            description: "a login page with email and password fields".to_string(),
            image_url: format!("http://localhost:4000/uploads/wireframes/{uid}.png"),
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            code: String::new(),
            created_by: email.to_string(),
        }
    }

    #[sqlx::test]
    async fn insert_and_lookup_round_trip(pool: PgPool) {
        seed_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Generations::new(&mut conn);

        let created = repo.create(&record("uid-1", "a@example.com")).await.unwrap();
        assert_eq!(created.uid, "uid-1");
        assert_eq!(created.code, "");

        // Lookup without intervening mutation returns identical field values.
        let first = repo.get_by_id("uid-1".to_string()).await.unwrap().unwrap();
        let second = repo.get_by_id("uid-1".to_string()).await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.description, second.description);
        assert_eq!(first.image_url, second.image_url);
        assert_eq!(first.code, second.code);
    }

    #[sqlx::test]
    async fn list_is_newest_first(pool: PgPool) {
        seed_user(&pool, "a@example.com").await;
        seed_user(&pool, "b@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Generations::new(&mut conn);

        repo.create(&record("uid-1", "a@example.com")).await.unwrap();
        repo.create(&record("uid-2", "a@example.com")).await.unwrap();
        repo.create(&record("uid-3", "b@example.com")).await.unwrap();

        let listed = repo.list_by_owner("a@example.com").await.unwrap();
        let uids: Vec<&str> = listed.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-2", "uid-1"]);
    }

    #[sqlx::test]
    async fn update_code_touches_only_code(pool: PgPool) {
        seed_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Generations::new(&mut conn);

        let before = repo.create(&record("uid-1", "a@example.com")).await.unwrap();
        let updated = repo.update_code("uid-1", "<html></html>").await.unwrap();
        assert_eq!(updated.as_deref(), Some("uid-1"));

        let after = repo.get_by_id("uid-1".to_string()).await.unwrap().unwrap();
        assert_eq!(after.code, "<html></html>");
        assert_eq!(after.description, before.description);
        assert_eq!(after.image_url, before.image_url);
        assert_eq!(after.model, before.model);
        assert_eq!(after.created_by, before.created_by);

        assert_eq!(repo.update_code("missing", "x").await.unwrap(), None);
    }

    #[sqlx::test]
    async fn delete_removes_row(pool: PgPool) {
        seed_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Generations::new(&mut conn);

        repo.create(&record("uid-1", "a@example.com")).await.unwrap();
        assert!(repo.delete("uid-1".to_string()).await.unwrap());
        assert!(repo.get_by_id("uid-1".to_string()).await.unwrap().is_none());
        assert!(!repo.delete("uid-1".to_string()).await.unwrap());
    }
}
