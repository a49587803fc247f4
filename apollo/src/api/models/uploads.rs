use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Durable retrieval URL for the stored wireframe
    pub image_url: String,
    /// Backend storage key (prefix + timestamp-derived filename)
    pub key: String,
}
