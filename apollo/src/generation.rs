//! The generation orchestrator: the three-step pipeline turning an uploaded
//! wireframe into a persisted, charged generation record.
//!
//! Step order is inference -> upload -> persist+charge, each step gated on
//! the previous one. There is deliberately no rollback of completed steps:
//! a failed upload does not refund the (external) inference cost, and a
//! rejected charge leaves the uploaded image in place. The persist+charge
//! step itself is atomic - the record insert and the credit debit commit or
//! roll back together, and the debit only succeeds while the balance is
//! positive.

use crate::db::errors::DbError;
use crate::db::handlers::{Generations, Repository, Users};
use crate::db::models::generations::{GenerationCreateDBRequest, GenerationDBResponse};
use crate::db::models::users::DebitOutcome;
use crate::inference::{ImageSource, InferenceError, VisionClient, VisionRequest};
use crate::storage::{ObjectStorage, StorageError, StoreRequest};
use crate::types::GenerationId;
use bytes::Bytes;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Typed failure for one orchestrated generation attempt. Each variant names
/// the step that failed; earlier steps completed, later steps never ran.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("AI processing failed")]
    Inference(#[source] InferenceError),

    #[error("failed to store wireframe image")]
    Upload(#[source] StorageError),

    #[error("Not enough credits")]
    InsufficientCredits,

    #[error("failed to save generation record")]
    Persist(#[source] DbError),
}

impl GenerateError {
    /// Stable machine-readable failure reason included in error responses.
    pub fn reason(&self) -> &'static str {
        match self {
            GenerateError::Inference(_) => "inference_failed",
            GenerateError::Upload(_) => "upload_failed",
            GenerateError::InsufficientCredits => "insufficient_credits",
            GenerateError::Persist(_) => "persist_failed",
        }
    }

    pub fn detail(&self) -> Option<String> {
        use std::error::Error as _;
        self.source().map(|source| source.to_string())
    }
}

/// Input to [`Orchestrator::create_generation`].
#[derive(Debug, Clone)]
pub struct NewGeneration {
    /// Client-generated correlation id
    pub uid: String,
    pub image: Bytes,
    pub content_type: String,
    pub model: String,
    pub description: String,
    pub created_by: String,
}

/// Successful outcome: identifiers for navigating to the detail view.
#[derive(Debug, Clone)]
pub struct CreatedGeneration {
    pub id: GenerationId,
    pub uid: String,
    pub image_url: String,
    pub credits_remaining: i32,
}

pub struct Orchestrator {
    db: PgPool,
    vision: VisionClient,
    storage: Arc<dyn ObjectStorage>,
}

impl Orchestrator {
    pub fn new(db: PgPool, vision: VisionClient, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { db, vision, storage }
    }

    /// Run the full create sequence for one wireframe.
    #[instrument(skip_all, fields(uid = %request.uid, model = %request.model, user = %request.created_by))]
    pub async fn create_generation(&self, request: NewGeneration) -> Result<CreatedGeneration, GenerateError> {
        // Step 1 - inference. Nothing is uploaded or charged until the model
        // has produced usable code.
        let code = self
            .vision
            .generate(&VisionRequest {
                model: request.model.clone(),
                description: request.description.clone(),
                image: ImageSource::from_bytes(&request.content_type, &request.image),
            })
            .await
            .map_err(GenerateError::Inference)?;

        tracing::debug!(code_len = code.len(), "inference complete");

        // Step 2 - upload the wireframe and obtain its durable URL.
        let stored = self
            .storage
            .store(StoreRequest {
                content: request.image.clone(),
                content_type: request.content_type.clone(),
            })
            .await
            .map_err(GenerateError::Upload)?;

        // Step 3 - persist the record and take one credit, atomically.
        let (record, credits_remaining) = self
            .persist_and_charge(&GenerationCreateDBRequest {
                uid: request.uid,
                description: request.description,
                image_url: stored.url,
                model: request.model,
                code,
                created_by: request.created_by,
            })
            .await?;

        tracing::info!(id = record.id, credits_remaining, "generation created");

        Ok(CreatedGeneration {
            id: record.id,
            uid: record.uid,
            image_url: record.image_url,
            credits_remaining,
        })
    }

    /// The authoritative charge gate: debit one credit and insert the record
    /// in a single transaction. A drained (or unknown) balance rejects the
    /// whole step with no record written.
    pub async fn persist_and_charge(
        &self,
        record: &GenerationCreateDBRequest,
    ) -> Result<(GenerationDBResponse, i32), GenerateError> {
        let mut tx = self.db.begin().await.map_err(|e| GenerateError::Persist(e.into()))?;

        let outcome = Users::new(&mut tx)
            .debit_credit(&record.created_by)
            .await
            .map_err(GenerateError::Persist)?;

        let credits_remaining = match outcome {
            DebitOutcome::Debited { remaining } => remaining,
            DebitOutcome::InsufficientCredits | DebitOutcome::NoSuchUser => {
                // Transaction dropped without commit; nothing persisted.
                return Err(GenerateError::InsufficientCredits);
            }
        };

        let inserted = Generations::new(&mut tx).create(record).await.map_err(GenerateError::Persist)?;

        tx.commit().await.map_err(|e| GenerateError::Persist(e.into()))?;

        Ok((inserted, credits_remaining))
    }

    /// Re-run only the inference step for an existing record and overwrite
    /// its code in place. No re-upload, no re-charge.
    #[instrument(skip_all, fields(uid = %record.uid))]
    pub async fn regenerate(
        &self,
        record: &GenerationDBResponse,
        model: Option<String>,
        description: Option<String>,
    ) -> Result<String, GenerateError> {
        let code = self
            .vision
            .generate(&VisionRequest {
                model: model.unwrap_or_else(|| record.model.clone()),
                description: description.unwrap_or_else(|| record.description.clone()),
                image: ImageSource::Url(record.image_url.clone()),
            })
            .await
            .map_err(GenerateError::Inference)?;

        let mut conn = self.db.acquire().await.map_err(|e| GenerateError::Persist(e.into()))?;
        Generations::new(&mut conn)
            .update_code(&record.uid, &code)
            .await
            .map_err(GenerateError::Persist)?
            .ok_or(GenerateError::Persist(DbError::NotFound))?;

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::storage::LocalObjectStorage;
    use sqlx::PgPool;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_completion(code: &str) -> String {
        let chunk = serde_json::json!({"choices": [{"delta": {"content": code}}]});
        format!("data: {chunk}\n\ndata: [DONE]\n\n")
    }

    async fn mock_vision(server: &MockServer, status: u16, body: String) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn orchestrator(pool: &PgPool, server: &MockServer, dir: &std::path::Path) -> (Orchestrator, Arc<dyn ObjectStorage>) {
        let mut config = InferenceConfig::default();
        config.base_url = server.uri().parse().unwrap();
        let vision = VisionClient::new(reqwest::Client::new(), config);
        let storage: Arc<dyn ObjectStorage> = Arc::new(LocalObjectStorage::new(
            dir.to_path_buf(),
            "wireframes".to_string(),
            "http://localhost:4000/uploads".to_string(),
        ));
        (Orchestrator::new(pool.clone(), vision, storage.clone()), storage)
    }

    async fn seed_user(pool: &PgPool, email: &str, credits: i32) {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                display_name: None,
                credits,
            })
            .await
            .unwrap();
    }

    fn new_generation(uid: &str, email: &str) -> NewGeneration {
        NewGeneration {
            uid: uid.to_string(),
            image: Bytes::from_static(&[0u8; 2048]),
            content_type: "image/png".to_string(),
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            description: "a login page with email and password fields".to_string(),
            created_by: email.to_string(),
        }
    }

    #[sqlx::test]
    async fn successful_generation_charges_one_credit(pool: PgPool) {
        let server = MockServer::start().await;
        mock_vision(&server, 200, sse_completion("<html>login</html>")).await;
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, storage) = orchestrator(&pool, &server, dir.path());

        seed_user(&pool, "a@example.com", 3).await;

        let created = orchestrator.create_generation(new_generation("uid-1", "a@example.com")).await.unwrap();
        assert_eq!(created.uid, "uid-1");
        assert_eq!(created.credits_remaining, 2);

        // Exactly one record, with the completed code and the stored image.
        let mut conn = pool.acquire().await.unwrap();
        let record = Generations::new(&mut conn).get_by_id("uid-1".to_string()).await.unwrap().unwrap();
        assert_eq!(record.code, "<html>login</html>");
        assert_eq!(record.image_url, created.image_url);

        let key = storage.key_for_url(&record.image_url).unwrap();
        assert!(storage.exists(&key).await.unwrap());

        assert_eq!(Users::new(&mut conn).get_credits("a@example.com").await.unwrap(), Some(2));
    }

    #[sqlx::test]
    async fn exhausted_balance_writes_nothing(pool: PgPool) {
        let server = MockServer::start().await;
        mock_vision(&server, 200, sse_completion("<html></html>")).await;
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _storage) = orchestrator(&pool, &server, dir.path());

        seed_user(&pool, "broke@example.com", 0).await;

        let err = orchestrator
            .create_generation(new_generation("uid-1", "broke@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InsufficientCredits));
        assert_eq!(err.reason(), "insufficient_credits");

        let mut conn = pool.acquire().await.unwrap();
        assert!(Generations::new(&mut conn).get_by_id("uid-1".to_string()).await.unwrap().is_none());
        assert_eq!(Users::new(&mut conn).get_credits("broke@example.com").await.unwrap(), Some(0));
    }

    #[sqlx::test]
    async fn inference_failure_uploads_nothing(pool: PgPool) {
        let server = MockServer::start().await;
        mock_vision(&server, 500, "provider exploded".to_string()).await;
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _storage) = orchestrator(&pool, &server, dir.path());

        seed_user(&pool, "a@example.com", 3).await;

        let err = orchestrator.create_generation(new_generation("uid-1", "a@example.com")).await.unwrap_err();
        assert_eq!(err.reason(), "inference_failed");

        // No upload happened (the prefix directory was never created), no
        // record was written, no credit was taken.
        assert!(!dir.path().join("wireframes").exists());
        let mut conn = pool.acquire().await.unwrap();
        assert!(Generations::new(&mut conn).get_by_id("uid-1".to_string()).await.unwrap().is_none());
        assert_eq!(Users::new(&mut conn).get_credits("a@example.com").await.unwrap(), Some(3));
    }

    #[sqlx::test]
    async fn regenerate_overwrites_only_code(pool: PgPool) {
        let server = MockServer::start().await;
        mock_vision(&server, 200, sse_completion("<html>v1</html>")).await;
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _storage) = orchestrator(&pool, &server, dir.path());

        seed_user(&pool, "a@example.com", 3).await;
        let created = orchestrator.create_generation(new_generation("uid-1", "a@example.com")).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let before = Generations::new(&mut conn).get_by_id(created.uid.clone()).await.unwrap().unwrap();

        // Point the mock at a different completion and regenerate.
        server.reset().await;
        mock_vision(&server, 200, sse_completion("<html>v2</html>")).await;

        let code = orchestrator.regenerate(&before, None, None).await.unwrap();
        assert_eq!(code, "<html>v2</html>");

        let after = Generations::new(&mut conn).get_by_id(created.uid.clone()).await.unwrap().unwrap();
        assert_eq!(after.code, "<html>v2</html>");
        assert_eq!(after.description, before.description);
        assert_eq!(after.image_url, before.image_url);
        assert_eq!(after.model, before.model);
        assert_eq!(after.created_by, before.created_by);
        // No re-charge.
        assert_eq!(Users::new(&mut conn).get_credits("a@example.com").await.unwrap(), Some(2));
    }
}
