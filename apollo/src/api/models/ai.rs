use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnhancePromptRequest {
    /// The rough prompt to restructure
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePromptResponse {
    /// The restructured prompt, clamped into the configured length bound
    pub enhanced_prompt: String,
    /// Present when the local fallback was used instead of the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
