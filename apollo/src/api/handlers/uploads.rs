//! Wireframe image upload.

use super::collect_wireframe_form;
use crate::api::models::uploads::UploadResponse;
use crate::errors::{Error, Result};
use crate::storage::StoreRequest;
use crate::AppState;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "uploads",
    summary = "Upload a wireframe image",
    description = "Stores the image under the configured prefix with a timestamp-derived filename \
                   and returns its durable retrieval URL.",
    request_body(
        content_type = "multipart/form-data",
        description = "Field: image (binary, under the configured size ceiling)"
    ),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing image field"),
        (status = 413, description = "Image over the size ceiling")
    )
)]
pub async fn upload_wireframe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let form = collect_wireframe_form(&mut multipart, state.config.generation.max_image_bytes).await?;

    let (content, content_type) = form.image.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: 'image'".to_string(),
    })?;

    let stored = state.storage.store(StoreRequest { content, content_type }).await?;

    tracing::info!(key = %stored.key, "wireframe uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            image_url: stored.url,
            key: stored.key,
        }),
    ))
}
