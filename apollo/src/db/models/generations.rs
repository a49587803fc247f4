//! Database models for generation records.

use crate::types::GenerationId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for inserting a generation record.
///
/// The `code` field may already hold the completed markup when the record is
/// persisted by the orchestrator; the compatibility flow writes it back later
/// through `update_code`.
#[derive(Debug, Clone)]
pub struct GenerationCreateDBRequest {
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub code: String,
    pub created_by: String,
}

/// Database response for a generation record
#[derive(Debug, Clone, FromRow)]
pub struct GenerationDBResponse {
    pub id: GenerationId,
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    pub code: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
