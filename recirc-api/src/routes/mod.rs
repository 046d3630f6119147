//! REST API Routes Module
//!
//! Route handlers for the RECIRC API:
//! - Pickup request lifecycle routes (under /api/v1/pickups, auth required)
//! - Health check endpoints (Kubernetes-compatible, no auth)
//! - OpenAPI spec endpoint
//! - CORS support for browser-based clients

pub mod health;
pub mod pickup;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use recirc_storage::PickupRepository;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::openapi::ApiDoc;

pub use health::create_router as health_router;
pub use pickup::create_router as pickup_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Build the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS (outermost) - handles preflight requests
/// 2. Trace - request spans
/// 3. Auth (only on /api/v1/*) - resolves the bearer credential
///
/// Health and OpenAPI endpoints sit outside the authenticated tree.
pub fn create_api_router(
    repo: Arc<dyn PickupRepository>,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    auth_config.validate_for_production()?;

    let auth_state = AuthMiddlewareState::new(auth_config);

    let api_routes = Router::new()
        .nest("/pickups", pickup::create_router(repo.clone()))
        .layer(from_fn_with_state(auth_state, auth_middleware));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router(repo))
        .route("/openapi.json", get(openapi_json));

    let cors = build_cors_layer(api_config);

    Ok(router
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
