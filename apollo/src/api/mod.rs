//! HTTP API layer.
//!
//! Split into [`handlers`] (axum request handlers) and [`models`]
//! (request/response DTOs). Handlers stay thin: validate input, call the
//! orchestrator/adapters/repositories, convert results into DTOs. Field
//! names on the wire are camelCase, matching the surface the original
//! frontend consumed.

pub mod handlers;
pub mod models;
