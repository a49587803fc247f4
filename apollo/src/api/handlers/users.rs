//! User provisioning and profile lookup.
//!
//! Sign-in itself happens at the external identity provider; these routes
//! only mirror the authenticated identity into the local account table so
//! the credit ledger has a row to charge.

use crate::api::models::users::{UserCreate, UserResponse};
use crate::db::handlers::Users;
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    summary = "Provision a user account",
    description = "Idempotent: creates the account with the configured starting credit balance, \
                   or returns the existing one untouched.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 200, description = "Account already existed", body = UserResponse),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn provision_user(
    State(state): State<AppState>,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (user, created) = Users::new(&mut conn)
        .get_or_create(&UserCreateDBRequest {
            email: request.email,
            display_name: request.display_name,
            credits: state.config.credits.initial_credits,
        })
        .await?;

    if created {
        tracing::info!(email = %user.email, credits = user.credits, "provisioned new user");
    }

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/users/{email}",
    tag = "users",
    summary = "Fetch a user profile with its credit balance",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(email): Path<String>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn).get_by_email(&email).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: email,
    })?;

    Ok(Json(UserResponse::from(user)))
}
