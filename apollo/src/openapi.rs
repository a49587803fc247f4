//! OpenAPI document for the management surface, served at `/docs`.

use crate::api::models::ai::{EnhancePromptRequest, EnhancePromptResponse};
use crate::api::models::generations::{
    CodeUpdate, CodeUpdateResponse, CreateRecordResponse, CreatedGenerationResponse, DeleteResponse, GenerationCreate,
    GenerationResponse, RegenerateRequest, RegenerateResponse,
};
use crate::api::models::uploads::UploadResponse;
use crate::api::models::users::{UserCreate, UserResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Apollo",
        description = "Wireframe-to-code generation service: upload a wireframe image, pick a \
                       vision model, describe the page, and receive generated HTML/CSS."
    ),
    paths(
        crate::api::handlers::ai::ai_process,
        crate::api::handlers::ai::enhance_prompt,
        crate::api::handlers::generations::create_record,
        crate::api::handlers::generations::get_records,
        crate::api::handlers::generations::update_record_code,
        crate::api::handlers::generations::delete_record,
        crate::api::handlers::generations::create_generation,
        crate::api::handlers::generations::regenerate,
        crate::api::handlers::uploads::upload_wireframe,
        crate::api::handlers::users::provision_user,
        crate::api::handlers::users::get_user,
    ),
    components(schemas(
        EnhancePromptRequest,
        EnhancePromptResponse,
        GenerationCreate,
        GenerationResponse,
        CodeUpdate,
        CodeUpdateResponse,
        CreateRecordResponse,
        DeleteResponse,
        CreatedGenerationResponse,
        RegenerateRequest,
        RegenerateResponse,
        UploadResponse,
        UserCreate,
        UserResponse,
    )),
    tags(
        (name = "ai", description = "Vision inference and prompt enhancement"),
        (name = "generations", description = "Generation records and the creation pipeline"),
        (name = "uploads", description = "Wireframe image storage"),
        (name = "users", description = "Account provisioning and credit balances")
    )
)]
pub struct ApiDoc;
