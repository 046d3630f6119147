//! Pickup Request REST API Routes
//!
//! Axum route handlers for the pickup-request lifecycle. Handlers stay thin:
//! they pull the authenticated principal out of request extensions, delegate
//! to the pickup service, and shape the response. Role gates are applied per
//! route group, so a caller with the wrong role is rejected before any entity
//! is loaded.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use recirc_core::Role;
use recirc_storage::PickupRepository;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{role_gate_middleware, PrincipalExtractor, RequiredRoles},
    services::pickup_service,
    types::{
        CreatePickupRequest, ListPickupsResponse, PickupTransitionRequest, SubmitFeedbackRequest,
    },
};

/// Roles allowed to file pickup requests and rate outcomes.
const REQUESTER_ONLY: &[Role] = &[Role::Requester];

/// Roles allowed on the agent-facing listings. Admins get read access to the
/// same listings but no transition powers.
const AGENT_AND_ADMIN: &[Role] = &[Role::Agent, Role::Admin];

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for pickup routes.
#[derive(Clone)]
pub struct PickupState {
    pub repo: Arc<dyn PickupRepository>,
}

impl PickupState {
    pub fn new(repo: Arc<dyn PickupRepository>) -> Self {
        Self { repo }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/pickups - File a new pickup request
#[utoipa::path(
    post,
    path = "/api/v1/pickups",
    tag = "Pickups",
    request_body = CreatePickupRequest,
    responses(
        (status = 201, description = "Pickup request created", body = recirc_core::PickupRequest),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not a requester", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_pickup(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
    Json(req): Json<CreatePickupRequest>,
) -> ApiResult<impl IntoResponse> {
    let pickup = pickup_service::create_pickup(state.repo.as_ref(), &principal, req).await?;
    Ok((StatusCode::CREATED, Json(pickup)))
}

/// GET /api/v1/pickups - List the caller's own pickup requests
#[utoipa::path(
    get,
    path = "/api/v1/pickups",
    tag = "Pickups",
    responses(
        (status = 200, description = "Pickup requests owned by the caller", body = ListPickupsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not a requester", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_pickups(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
) -> ApiResult<impl IntoResponse> {
    let pickups = pickup_service::list_owned(state.repo.as_ref(), &principal).await?;
    Ok(Json(list_response(pickups)))
}

/// GET /api/v1/pickups/agent/available - List all pending pickup requests
///
/// The available listing is never owner-filtered: any agent sees every
/// pending request.
#[utoipa::path(
    get,
    path = "/api/v1/pickups/agent/available",
    tag = "Pickups",
    responses(
        (status = 200, description = "Pending pickup requests", body = ListPickupsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not an agent", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_available_pickups(
    State(state): State<Arc<PickupState>>,
) -> ApiResult<impl IntoResponse> {
    let pickups = pickup_service::list_available(state.repo.as_ref()).await?;
    Ok(Json(list_response(pickups)))
}

/// GET /api/v1/pickups/agent/assigned - List requests assigned to the caller
#[utoipa::path(
    get,
    path = "/api/v1/pickups/agent/assigned",
    tag = "Pickups",
    responses(
        (status = 200, description = "Pickup requests assigned to the caller", body = ListPickupsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not an agent", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_assigned_pickups(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
) -> ApiResult<impl IntoResponse> {
    let pickups = pickup_service::list_assigned(state.repo.as_ref(), &principal).await?;
    Ok(Json(list_response(pickups)))
}

/// GET /api/v1/pickups/{id} - Fetch a single pickup request
///
/// Readable by the owner, the assigned agent, any agent while the request is
/// still pending, and admins.
#[utoipa::path(
    get,
    path = "/api/v1/pickups/{id}",
    tag = "Pickups",
    params(("id" = Uuid, Path, description = "Pickup request ID")),
    responses(
        (status = 200, description = "Pickup request details", body = recirc_core::PickupRequest),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not authorized to view this request", body = ApiError),
        (status = 404, description = "Pickup request not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_pickup(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let pickup = pickup_service::get_pickup(state.repo.as_ref(), &principal, id).await?;
    Ok(Json(pickup))
}

/// POST /api/v1/pickups/{id}/transition - Apply a lifecycle transition
///
/// The payload is a tagged action: claim, start, and complete belong to
/// agents, cancel to the owning requester. The caller's role is checked
/// against the action itself, not just the route.
#[utoipa::path(
    post,
    path = "/api/v1/pickups/{id}/transition",
    tag = "Pickups",
    params(("id" = Uuid, Path, description = "Pickup request ID")),
    request_body = PickupTransitionRequest,
    responses(
        (status = 200, description = "Transition applied", body = recirc_core::PickupRequest),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller's role cannot perform this action", body = ApiError),
        (status = 404, description = "Pickup request not found", body = ApiError),
        (status = 409, description = "Transition conflicts with the current state", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn transition_pickup(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<PickupTransitionRequest>,
) -> ApiResult<impl IntoResponse> {
    let pickup =
        pickup_service::apply_transition(state.repo.as_ref(), &principal, id, req).await?;
    Ok(Json(pickup))
}

/// POST /api/v1/pickups/{id}/feedback - Rate a completed pickup
#[utoipa::path(
    post,
    path = "/api/v1/pickups/{id}/feedback",
    tag = "Pickups",
    params(("id" = Uuid, Path, description = "Pickup request ID")),
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = recirc_core::PickupRequest),
        (status = 400, description = "Invalid rating", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller does not own this request", body = ApiError),
        (status = 404, description = "Pickup request not found", body = ApiError),
        (status = 409, description = "Pickup is not completed yet", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_feedback(
    State(state): State<Arc<PickupState>>,
    principal: PrincipalExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> ApiResult<impl IntoResponse> {
    let pickup =
        pickup_service::submit_feedback(state.repo.as_ref(), &principal, id, req).await?;
    Ok(Json(pickup))
}

fn list_response(pickups: Vec<recirc_core::PickupRequest>) -> ListPickupsResponse {
    let total = pickups.len() as i32;
    ListPickupsResponse { pickups, total }
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the pickup routes router.
///
/// Routes are grouped by the role set that may call them; the shared group
/// (get by id, transition) admits any authenticated principal and defers the
/// finer ownership and action-role checks to the service.
pub fn create_router(repo: Arc<dyn PickupRepository>) -> Router {
    let state = Arc::new(PickupState::new(repo));

    let requester_routes = Router::new()
        .route("/", post(create_pickup).get(list_my_pickups))
        .route("/:id/feedback", post(submit_feedback))
        .route_layer(from_fn_with_state(
            RequiredRoles(REQUESTER_ONLY),
            role_gate_middleware,
        ));

    let agent_routes = Router::new()
        .route("/agent/available", get(list_available_pickups))
        .route("/agent/assigned", get(list_assigned_pickups))
        .route_layer(from_fn_with_state(
            RequiredRoles(AGENT_AND_ADMIN),
            role_gate_middleware,
        ));

    let shared_routes = Router::new()
        .route("/:id", get(get_pickup))
        .route("/:id/transition", post(transition_pickup));

    Router::new()
        .merge(requester_routes)
        .merge(agent_routes)
        .merge(shared_routes)
        .with_state(state)
}
