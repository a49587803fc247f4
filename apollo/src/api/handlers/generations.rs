//! Generation record CRUD and the orchestrated creation pipeline.

use super::{collect_wireframe_form, require_model, require_text};
use crate::api::models::generations::{
    CodeUpdate, CodeUpdateResponse, CreateRecordResponse, CreatedGenerationResponse, DeleteQuery, DeleteResponse,
    GenerationCreate, GenerationQuery, GenerationResponse, RegenerateRequest, RegenerateResponse,
};
use crate::db::handlers::{Generations, Repository};
use crate::db::models::generations::{GenerationCreateDBRequest, GenerationDBResponse};
use crate::errors::{Error, Result};
use crate::generation::{GenerateError, NewGeneration};
use crate::inference::{ImageSource, VisionRequest};
use crate::storage::StorageError;
use crate::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

async fn load_record(state: &AppState, uid: &str) -> Result<Option<GenerationDBResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = Generations::new(&mut conn).get_by_id(uid.to_string()).await?;
    Ok(record)
}

#[utoipa::path(
    post,
    path = "/api/wireframe-to-code",
    tag = "generations",
    summary = "Persist a generation and charge one credit",
    description = "Charge-gated persistence for a wireframe that is already uploaded: re-invokes \
                   vision inference on the stored image, then inserts the record and debits one \
                   credit in a single transaction.",
    request_body = GenerationCreate,
    responses(
        (status = 201, description = "Record created", body = CreateRecordResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 402, description = "Not enough credits"),
        (status = 502, description = "Inference provider failure")
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<GenerationCreate>,
) -> Result<(StatusCode, Json<CreateRecordResponse>)> {
    let uid = require_text(Some(request.uid), "uid")?;
    let description = require_text(Some(request.description), "description")?;
    let email = require_text(Some(request.email), "email")?;
    let image_url = require_text(Some(request.image_url), "imageUrl")?;
    let model = require_model(&state.config, &request.model)?;

    // Inference re-invocation against the stored image. The completed code
    // goes straight onto the record; the client's streamed copy may still
    // overwrite it through PUT.
    let code = state
        .vision
        .generate(&VisionRequest {
            model: model.model.clone(),
            description: description.clone(),
            image: ImageSource::Url(image_url.clone()),
        })
        .await
        .map_err(|e| Error::Generation(GenerateError::Inference(e)))?;

    let (record, _credits_remaining) = state
        .orchestrator
        .persist_and_charge(&GenerationCreateDBRequest {
            uid,
            description,
            image_url,
            model: model.model.clone(),
            code,
            created_by: email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRecordResponse {
            id: record.id,
            uid: record.uid,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/wireframe-to-code",
    tag = "generations",
    summary = "Look up generation records",
    description = "With `uid`, returns the matching record; with `email`, returns the owner's \
                   records newest first.",
    params(GenerationQuery),
    responses(
        (status = 200, description = "Record or record list", body = GenerationResponse),
        (status = 404, description = "No record found")
    )
)]
pub async fn get_records(State(state): State<AppState>, Query(query): Query<GenerationQuery>) -> Result<Response> {
    if let Some(uid) = query.uid {
        let record = load_record(&state, &uid).await?.ok_or_else(|| Error::NotFound {
            resource: "Generation record".to_string(),
            id: uid.clone(),
        })?;
        return Ok(Json(GenerationResponse::from(record)).into_response());
    }

    if let Some(email) = query.email {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let records = Generations::new(&mut conn).list_by_owner(&email).await?;
        let records: Vec<GenerationResponse> = records.into_iter().map(GenerationResponse::from).collect();
        return Ok(Json(records).into_response());
    }

    Ok((StatusCode::NOT_FOUND, Json(json!({ "error": "No Record Found" }))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/wireframe-to-code",
    tag = "generations",
    summary = "Write generated code back onto a record",
    request_body = CodeUpdate,
    responses(
        (status = 200, description = "Code updated", body = CodeUpdateResponse),
        (status = 404, description = "Unknown uid")
    )
)]
pub async fn update_record_code(
    State(state): State<AppState>,
    Json(request): Json<CodeUpdate>,
) -> Result<Json<CodeUpdateResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let updated = Generations::new(&mut conn).update_code(&request.uid, &request.code_resp).await?;

    match updated {
        Some(uid) => Ok(Json(CodeUpdateResponse { uid })),
        None => Err(Error::NotFound {
            resource: "Generation record".to_string(),
            id: request.uid,
        }),
    }
}

#[utoipa::path(
    delete,
    path = "/api/wireframe-to-code",
    tag = "generations",
    summary = "Delete a record and its stored image",
    description = "Removes the stored wireframe first, then the record. If the object deletion \
                   fails the record is left intact, so no partial delete can occur.",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Record and image deleted", body = DeleteResponse),
        (status = 400, description = "Missing uid"),
        (status = 404, description = "Unknown uid"),
        (status = 500, description = "Object store failure, nothing deleted")
    )
)]
pub async fn delete_record(State(state): State<AppState>, Query(query): Query<DeleteQuery>) -> Result<Json<DeleteResponse>> {
    let uid = query.uid.ok_or_else(|| Error::BadRequest {
        message: "UID is required".to_string(),
    })?;

    let record = load_record(&state, &uid).await?.ok_or_else(|| Error::NotFound {
        resource: "Generation record".to_string(),
        id: uid.clone(),
    })?;

    // Object first, row second. A failed object delete aborts here and
    // leaves both halves intact.
    match state.storage.key_for_url(&record.image_url) {
        Some(key) => match state.storage.delete(&key).await {
            Ok(()) | Err(StorageError::NotFound) => {
                // An already-missing object doesn't block the row delete.
            }
            Err(e) => return Err(Error::Storage(e)),
        },
        None => {
            tracing::warn!(
                uid = %uid,
                image_url = %record.image_url,
                "image URL not managed by the configured storage backend, skipping object delete"
            );
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Generations::new(&mut conn).delete(uid).await?;

    Ok(Json(DeleteResponse { success: true }))
}

#[utoipa::path(
    post,
    path = "/api/generations",
    tag = "generations",
    summary = "Create a generation end-to-end",
    description = "The full pipeline in one request: vision inference on the uploaded wireframe, \
                   image upload to the object store, then record insert plus credit debit in one \
                   transaction. Failures carry a typed `reason`.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: image (binary), model, description, email, uid (optional)"
    ),
    responses(
        (status = 201, description = "Generation created", body = CreatedGenerationResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 402, description = "Not enough credits (reason: insufficient_credits)"),
        (status = 413, description = "Image over the size ceiling"),
        (status = 502, description = "Inference failure (reason: inference_failed)")
    )
)]
pub async fn create_generation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedGenerationResponse>)> {
    let form = collect_wireframe_form(&mut multipart, state.config.generation.max_image_bytes).await?;

    let (image, content_type) = form.image.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: 'image'".to_string(),
    })?;
    let model = require_model(&state.config, &require_text(form.model, "model")?)?;
    let description = require_text(form.description, "description")?;
    let created_by = require_text(form.email, "email")?;
    let uid = form.uid.filter(|uid| !uid.trim().is_empty()).unwrap_or_else(|| Uuid::new_v4().to_string());

    let created = state
        .orchestrator
        .create_generation(NewGeneration {
            uid,
            image,
            content_type,
            model: model.model.clone(),
            description,
            created_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedGenerationResponse::from(created))))
}

#[utoipa::path(
    post,
    path = "/api/generations/{uid}/regenerate",
    tag = "generations",
    summary = "Re-run inference for an existing record",
    description = "Re-runs only the inference step against the stored image and overwrites the \
                   record's code in place. No re-upload, no credit charge.",
    params(("uid" = String, Path, description = "Record uid")),
    request_body = RegenerateRequest,
    responses(
        (status = 200, description = "Code regenerated", body = RegenerateResponse),
        (status = 404, description = "Unknown uid"),
        (status = 502, description = "Inference provider failure")
    )
)]
pub async fn regenerate(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>> {
    let record = load_record(&state, &uid).await?.ok_or_else(|| Error::NotFound {
        resource: "Generation record".to_string(),
        id: uid.clone(),
    })?;

    // Validate a model override against the enumerated set before spending
    // an inference call on it.
    let model = match &request.model {
        Some(model) => Some(require_model(&state.config, model)?.model.clone()),
        None => None,
    };

    let code = state.orchestrator.regenerate(&record, model, request.description).await?;

    Ok(Json(RegenerateResponse { uid: record.uid, code }))
}
