//! Route configuration and setup.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use streamvault_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthLayerState, TokenVerifier};
use crate::handlers::{caption_upload, chunked_upload, video_access, video_upload};
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = setup_cors(config)?;
    let auth_state = setup_auth_state(config);

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/openapi.json", get(openapi_json));

    let protected_routes = Router::new()
        .route("/api/v1/videos/upload", post(video_upload::upload_video))
        .route(
            "/api/v1/videos/upload-chunk",
            post(chunked_upload::upload_video_chunk),
        )
        .route(
            "/api/v1/videos/{video_id}/captions",
            post(caption_upload::upload_caption),
        )
        .route(
            "/api/v1/videos/{video_id}/download-url",
            get(video_access::get_download_url),
        )
        .route(
            "/api/v1/videos/{video_id}/visibility",
            patch(video_access::set_visibility),
        )
        .route(
            "/api/v1/videos/{video_id}",
            delete(video_access::delete_video),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    // Leave headroom above the raw file size for multipart framing and the
    // declared-metadata fields.
    let body_limit = (config.max_video_size_bytes as usize).saturating_add(10 * 1024 * 1024);

    let app = public_routes
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

fn setup_auth_state(config: &Config) -> Arc<AuthLayerState> {
    let verifier = if config.auth_disabled {
        None
    } else {
        Some(Arc::new(TokenVerifier::new(
            config.auth_certs_url.clone(),
            config.auth_audience.clone(),
            config.auth_key_cache_ttl_secs,
        )))
    };
    Arc::new(AuthLayerState { verifier })
}

fn setup_cors(config: &Config) -> anyhow::Result<CorsLayer> {
    if config.cors_origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid CORS origin")?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::api_doc::ApiDoc::openapi())
}
