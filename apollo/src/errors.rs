use crate::db::errors::DbError;
use crate::generation::GenerateError;
use crate::inference::InferenceError;
use crate::storage::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Request body (usually the wireframe image) over the size ceiling
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Typed failure from the generation pipeline
    #[error(transparent)]
    Generation(#[from] GenerateError),

    /// Upstream model failure outside the pipeline (streaming route,
    /// prompt enhancement)
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Object storage failure (upload/delete outside the pipeline)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Generation(gen_err) => match gen_err {
                GenerateError::Inference(_) => StatusCode::BAD_GATEWAY,
                GenerateError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
                GenerateError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
                GenerateError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Inference(_) => StatusCode::BAD_GATEWAY,
            Error::Storage(storage_err) => match storage_err {
                StorageError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Generation(gen_err) => match gen_err {
                GenerateError::Inference(_) => "AI processing failed".to_string(),
                GenerateError::Upload(_) => "Failed to store wireframe image".to_string(),
                GenerateError::InsufficientCredits => "Not enough credits".to_string(),
                GenerateError::Persist(_) => "Failed to save generation record".to_string(),
            },
            Error::Inference(_) => "AI processing failed".to_string(),
            Error::Storage(storage_err) => match storage_err {
                StorageError::NotFound => "Stored image not found".to_string(),
                _ => "File storage operation failed".to_string(),
            },
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => {
                        "An account with this email address already exists".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Supplementary detail surfaced to the caller alongside the message,
    /// mirroring the `{error, details}` body shape of the error responses.
    fn details(&self) -> Option<String> {
        match self {
            Error::Generation(gen_err) => gen_err.detail(),
            Error::Inference(inf_err) => Some(inf_err.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Generation(GenerateError::InsufficientCredits) => {
                tracing::info!("Generation rejected: insufficient credits");
            }
            Error::Generation(_) | Error::Inference(_) | Error::Storage(_) => {
                tracing::warn!("Upstream/storage error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        let mut body = json!({ "error": self.user_message() });
        if let Error::Generation(gen_err) = &self {
            body["reason"] = json!(gen_err.reason());
        }
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failures_map_to_distinct_statuses() {
        let credits = Error::Generation(GenerateError::InsufficientCredits);
        assert_eq!(credits.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(credits.user_message(), "Not enough credits");

        let inference = Error::Generation(GenerateError::Inference(InferenceError::EmptyCompletion));
        assert_eq!(inference.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(inference.user_message(), "AI processing failed");
    }

    #[test]
    fn db_not_found_is_404() {
        let err = Error::Database(DbError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
