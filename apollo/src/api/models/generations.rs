use crate::db::models::generations::GenerationDBResponse;
use crate::generation::CreatedGeneration;
use crate::types::GenerationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /api/wireframe-to-code`: persist-and-charge for an image
/// that is already in the object store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCreate {
    /// Client-generated correlation id
    pub uid: String,
    pub description: String,
    /// Retrieval URL of the uploaded wireframe
    pub image_url: String,
    /// One of the enumerated model identifiers
    pub model: String,
    /// Owning user's email
    pub email: String,
}

/// A persisted generation record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[schema(value_type = i64)]
    pub id: GenerationId,
    pub uid: String,
    pub description: String,
    pub image_url: String,
    pub model: String,
    /// Generated markup; empty until the first successful inference is
    /// written back
    pub code: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<GenerationDBResponse> for GenerationResponse {
    fn from(db: GenerationDBResponse) -> Self {
        Self {
            id: db.id,
            uid: db.uid,
            description: db.description,
            image_url: db.image_url,
            model: db.model,
            code: db.code,
            created_by: db.created_by,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for record lookup: by uid (single record) or by owner
/// email (newest first)
#[derive(Debug, Deserialize, IntoParams)]
pub struct GenerationQuery {
    pub uid: Option<String>,
    pub email: Option<String>,
}

/// Query parameters for record deletion
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteQuery {
    pub uid: Option<String>,
}

/// Body of `PUT /api/wireframe-to-code`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeUpdate {
    pub uid: String,
    /// The streamed completion the client collected
    pub code_resp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CodeUpdateResponse {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRecordResponse {
    #[schema(value_type = i64)]
    pub id: GenerationId,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Response of the orchestrated `POST /api/generations`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGenerationResponse {
    #[schema(value_type = i64)]
    pub id: GenerationId,
    pub uid: String,
    pub image_url: String,
    pub credits_remaining: i32,
}

impl From<CreatedGeneration> for CreatedGenerationResponse {
    fn from(created: CreatedGeneration) -> Self {
        Self {
            id: created.id,
            uid: created.uid,
            image_url: created.image_url,
            credits_remaining: created.credits_remaining,
        }
    }
}

/// Body of `POST /api/generations/{uid}/regenerate`; both overrides are
/// optional and apply to the inference call only
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegenerateResponse {
    pub uid: String,
    pub code: String,
}
