//! API request handlers.

pub mod ai;
pub mod generations;
pub mod uploads;
pub mod users;

use crate::config::{Config, ModelInfo};
use crate::errors::{Error, Result};
use axum::extract::Multipart;
use bytes::Bytes;

/// Fields collected from a wireframe multipart form. Routes pick the subset
/// they require; unknown fields are ignored for forward compatibility.
#[derive(Debug, Default)]
pub(crate) struct WireframeForm {
    /// Image content and its content type
    pub image: Option<(Bytes, String)>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub uid: Option<String>,
}

/// Drain a multipart body into a [`WireframeForm`], enforcing the image size
/// ceiling as the data streams in.
pub(crate) async fn collect_wireframe_form(multipart: &mut Multipart, max_image_bytes: usize) -> Result<WireframeForm> {
    let mut form = WireframeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or("image/png").to_string();
                let content = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read image field: {e}"),
                })?;

                if content.is_empty() {
                    return Err(Error::BadRequest {
                        message: "Image cannot be empty".to_string(),
                    });
                }

                if content.len() > max_image_bytes {
                    return Err(Error::PayloadTooLarge {
                        message: format!(
                            "Image size too large. Please use an image under {}MB.",
                            max_image_bytes / (1024 * 1024)
                        ),
                    });
                }

                form.image = Some((content, content_type));
            }
            "model" => form.model = Some(read_text_field(field, "model").await?),
            "description" => form.description = Some(read_text_field(field, "description").await?),
            "email" => form.email = Some(read_text_field(field, "email").await?),
            "uid" => form.uid = Some(read_text_field(field, "uid").await?),
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    Ok(form)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field.text().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read {name}: {e}"),
    })
}

/// Resolve a client-supplied model against the enumerated set.
pub(crate) fn require_model<'a>(config: &'a Config, model: &str) -> Result<&'a ModelInfo> {
    config.inference.find_model(model).ok_or_else(|| Error::BadRequest {
        message: format!("Unknown model: {model}"),
    })
}

/// Reject empty or whitespace-only required text input.
pub(crate) fn require_text(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::BadRequest {
            message: format!("Missing required field: '{name}'"),
        }),
    }
}
