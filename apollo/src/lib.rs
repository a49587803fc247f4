//! # apollo: wireframe-to-code generation service
//!
//! `apollo` is the backend of a wireframe-to-code application: users upload a
//! rough sketch of a page, pick a vision-capable model, describe what they
//! want, and receive generated HTML/CSS. Results are persisted per user and
//! can be listed, regenerated in place, or deleted. A per-user credit ledger
//! gates how many generations each account may run.
//!
//! ## Architecture
//!
//! The service is built on [Axum](https://github.com/tokio-rs/axum) with
//! PostgreSQL for persistence. Three adapter layers isolate the external
//! collaborators:
//!
//! - [`inference`] talks to an OpenAI-compatible model gateway; the vision
//!   client consumes streamed completions as SSE, the text client backs
//!   prompt enhancement.
//! - [`storage`] holds the uploaded wireframe images behind the
//!   [`storage::ObjectStorage`] trait (local directory or S3), minting the
//!   durable URLs recorded on generation records.
//! - [`db`] applies the repository pattern over sqlx for the generation
//!   records and the user/credit table.
//!
//! The [`generation::Orchestrator`] ties them together as the one non-CRUD
//! flow: inference first, then image upload, then an atomic
//! persist-and-charge transaction. Each step is gated on the previous one
//! and failures carry a typed reason
//! (`inference_failed | upload_failed | insufficient_credits | persist_failed`).
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use apollo::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = apollo::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     apollo::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod inference;
mod openapi;
pub mod prompt;
pub mod storage;
pub mod telemetry;
mod types;

pub use config::Config;
pub use types::{GenerationId, UserId};

use crate::generation::Orchestrator;
use crate::inference::{TextClient, VisionClient};
use crate::openapi::ApiDoc;
use crate::storage::ObjectStorage;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Holds the database pool, configuration, the storage backend, both
/// inference clients, and the generation orchestrator built on top of them.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: Arc<dyn ObjectStorage>,
    pub vision: VisionClient,
    pub text: TextClient,
    pub orchestrator: Arc<Orchestrator>,
}

/// Get the apollo database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let mut origins = Vec::new();
    for origin in &config.cors_allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}

/// Build the application router with all endpoints and middleware.
///
/// - `/api/*` - the management surface (generation records, uploads, users,
///   prompt enhancement, the streaming generation route)
/// - `/uploads/*` - stored wireframe images, when local storage is configured
/// - `/docs` - Scalar UI over the OpenAPI document
/// - `/healthz` - liveness probe
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Routes that accept a wireframe image need a body limit above the
    // configured image ceiling (plus slack for the other form fields).
    let upload_body_limit = DefaultBodyLimit::max(state.config.generation.max_image_bytes + 1024 * 1024);

    let upload_routes = Router::new()
        .route("/ai-process", post(api::handlers::ai::ai_process))
        .route("/generations", post(api::handlers::generations::create_generation))
        .route("/uploads", post(api::handlers::uploads::upload_wireframe))
        .layer(upload_body_limit);

    let api_routes = Router::new()
        .merge(upload_routes)
        .route("/enhance-prompt", post(api::handlers::ai::enhance_prompt))
        .route(
            "/wireframe-to-code",
            post(api::handlers::generations::create_record)
                .get(api::handlers::generations::get_records)
                .put(api::handlers::generations::update_record_code)
                .delete(api::handlers::generations::delete_record),
        )
        .route(
            "/generations/{uid}/regenerate",
            post(api::handlers::generations::regenerate),
        )
        .route("/users", post(api::handlers::users::provision_user))
        .route("/users/{email}", get(api::handlers::users::get_user))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Serve locally stored wireframes so the minted URLs resolve.
    if let config::StorageConfig::Local { path, .. } = &state.config.storage {
        router = router.nest_service("/uploads", ServeDir::new(path));
    }

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to PostgreSQL, runs
///    migrations, builds the storage backend and inference clients, and
///    assembles the router.
/// 2. **Serve**: [`Application::serve`] binds the TCP listener and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application over an existing pool (used by tests, which
    /// bring their own migrated database).
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        let pool = match pool {
            Some(pool) => pool,
            None => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database.max_connections())
                    .connect(config.database.url())
                    .await?;
                migrator().run(&pool).await?;
                pool
            }
        };

        let storage = storage::create_object_storage(&config).await?;

        // One HTTP client for both inference adapters; the timeout bounds a
        // whole call including the streamed body.
        let http = reqwest::Client::builder().timeout(config.inference.request_timeout).build()?;
        let vision = VisionClient::new(http.clone(), config.inference.clone());
        let text = TextClient::new(http, config.inference.clone(), config.enhance.bounds());

        let orchestrator = Arc::new(Orchestrator::new(pool.clone(), vision.clone(), storage.clone()));

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .storage(storage)
            .vision(vision)
            .text(text)
            .orchestrator(orchestrator)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Apollo listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use std::path::Path;

    /// Build a test server over an already-migrated pool, pointing inference
    /// at a mock server and storage at a temp directory.
    pub async fn create_test_app(pool: PgPool, inference_url: &str, storage_dir: &Path) -> axum_test::TestServer {
        let mut config = Config::default();
        config.inference.base_url = inference_url.parse().expect("mock server url");
        config.storage = config::StorageConfig::Local {
            path: storage_dir.to_path_buf(),
            prefix: "wireframes".to_string(),
        };

        Application::new_with_pool(config, Some(pool))
            .await
            .expect("Failed to create application")
            .into_test_server()
    }

    pub fn sse_completion(code: &str) -> String {
        let chunk = serde_json::json!({"choices": [{"delta": {"content": code}}]});
        format!("data: {chunk}\n\ndata: [DONE]\n\n")
    }

    pub async fn mock_vision_completion(server: &wiremock::MockServer, code: &str) {
        use wiremock::matchers::{method, path};
        wiremock::Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_completion(code)),
            )
            .mount(server)
            .await;
    }
}
