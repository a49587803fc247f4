//! Streaming code generation and prompt enhancement.

use super::{collect_wireframe_form, require_model, require_text};
use crate::api::models::ai::{EnhancePromptRequest, EnhancePromptResponse};
use crate::errors::{Error, Result};
use crate::inference::{ImageSource, VisionRequest};
use crate::prompt;
use crate::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};

/// Note used when the local fallback replaced a failed model call.
const FALLBACK_NOTE: &str = "Used fallback enhancement due to API issues";

#[utoipa::path(
    post,
    path = "/api/ai-process",
    tag = "ai",
    summary = "Generate code from a wireframe, streamed",
    description = "Runs vision inference on the uploaded wireframe and streams the generated \
                   markup back as plain text chunks.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: image (binary), model (enumerated id), description (free text)"
    ),
    responses(
        (status = 200, description = "Streamed completion text", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing or invalid field"),
        (status = 413, description = "Image over the size ceiling"),
        (status = 502, description = "Inference provider failure")
    )
)]
pub async fn ai_process(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let form = collect_wireframe_form(&mut multipart, state.config.generation.max_image_bytes).await?;

    let (image, content_type) = form.image.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: 'image'".to_string(),
    })?;
    let model = require_model(&state.config, &require_text(form.model, "model")?)?;
    let description = require_text(form.description, "description")?;

    let stream = state
        .vision
        .stream(&VisionRequest {
            model: model.model.clone(),
            description,
            image: ImageSource::from_bytes(&content_type, &image),
        })
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/enhance-prompt",
    tag = "ai",
    summary = "Restructure a rough prompt",
    description = "Rewrites the prompt into a brief numbered list via the text model, clamped to \
                   the configured length bound. Falls back to a deterministic local template when \
                   the model call fails.",
    responses(
        (status = 200, description = "Enhanced prompt", body = EnhancePromptResponse),
        (status = 400, description = "Prompt length outside the configured bound")
    )
)]
pub async fn enhance_prompt(
    State(state): State<AppState>,
    Json(request): Json<EnhancePromptRequest>,
) -> Result<Json<EnhancePromptResponse>> {
    let bounds = state.config.enhance.bounds();

    // Length is validated before any inference call is made.
    prompt::validate(&request.prompt, bounds).map_err(|message| Error::BadRequest { message })?;

    match state.text.enhance(&request.prompt).await {
        Ok(raw) => {
            let cleaned = prompt::strip_reasoning_preamble(&raw);
            Ok(Json(EnhancePromptResponse {
                enhanced_prompt: prompt::clamp(cleaned, bounds),
                note: None,
            }))
        }
        Err(e) => {
            tracing::warn!("Prompt enhancement via model failed, using local fallback: {e}");
            Ok(Json(EnhancePromptResponse {
                enhanced_prompt: prompt::fallback_enhance(&request.prompt, bounds),
                note: Some(FALLBACK_NOTE.to_string()),
            }))
        }
    }
}
