//! End-to-End Pickup Flow Tests
//!
//! Drives the assembled API router through `tower::ServiceExt::oneshot`,
//! covering the full lifecycle (create -> claim -> start -> complete ->
//! feedback), the losing claim, and the auth/role rejections on each
//! surface.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use recirc_api::{
    auth::{issue_token, AuthConfig, JwtSecret},
    create_api_router, ApiConfig,
};
use recirc_core::{new_entity_id, Role, UserId};
use recirc_storage::{MemoryPickupRepository, PickupRepository};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// TEST SUPPORT
// ============================================================================

fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt_secret =
        JwtSecret::new("integration_test_secret".to_string()).expect("test secret");
    config
}

fn test_app() -> Router {
    let repo: Arc<dyn PickupRepository> = Arc::new(MemoryPickupRepository::new());
    create_api_router(repo, &ApiConfig::default(), test_auth_config())
        .expect("router should assemble")
}

fn bearer(user_id: UserId, role: Role) -> String {
    let token = issue_token(&test_auth_config(), user_id, role).expect("token should sign");
    format!("Bearer {}", token)
}

fn create_payload() -> Value {
    json!({
        "items": [{"category": "computer", "quantity": 1, "description": "Old desktop tower"}],
        "scheduled_date": "2025-06-01",
        "scheduled_time": "09:00",
        "address": {
            "street": "12 Loop Rd",
            "city": "Oakland",
            "state": "CA",
            "zip_code": "94607",
            "country": "US"
        }
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should complete");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

// ============================================================================
// LIFECYCLE FLOW
// ============================================================================

#[tokio::test]
async fn test_full_pickup_lifecycle_over_http() {
    let app = test_app();
    let requester_id = new_entity_id();
    let agent_id = new_entity_id();
    let requester = bearer(requester_id, Role::Requester);
    let agent = bearer(agent_id, Role::Agent);

    // Requester files a pickup request.
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(create_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["owner_id"], requester_id.to_string());
    let pickup_id = created["pickup_id"].as_str().expect("pickup id").to_string();

    // The request shows up in the agent's available listing.
    let (status, listing) = send(
        &app,
        Method::GET,
        "/api/v1/pickups/agent/available",
        Some(&agent),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);

    // Agent claims it.
    let uri = format!("/api/v1/pickups/{}/transition", pickup_id);
    let (status, claimed) = send(
        &app,
        Method::POST,
        &uri,
        Some(&agent),
        Some(json!({"action": "claim"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["status"], "assigned");
    assert_eq!(claimed["assigned_agent_id"], agent_id.to_string());

    // Agent starts servicing.
    let (status, started) = send(
        &app,
        Method::POST,
        &uri,
        Some(&agent),
        Some(json!({"action": "start"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in-progress");

    // Agent completes with a note.
    let (status, completed) = send(
        &app,
        Method::POST,
        &uri,
        Some(&agent),
        Some(json!({"action": "complete", "closing_note": "Picked up"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["closing_note"], "Picked up");

    // Requester rates the outcome.
    let feedback_uri = format!("/api/v1/pickups/{}/feedback", pickup_id);
    let (status, rated) = send(
        &app,
        Method::POST,
        &feedback_uri,
        Some(&requester),
        Some(json!({"rating": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rated["feedback"]["rating"], 5);
}

#[tokio::test]
async fn test_losing_claim_returns_conflict() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);
    let winner_id = new_entity_id();
    let winner = bearer(winner_id, Role::Agent);
    let loser = bearer(new_entity_id(), Role::Agent);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(create_payload()),
    )
    .await;
    let uri = format!(
        "/api/v1/pickups/{}/transition",
        created["pickup_id"].as_str().expect("pickup id")
    );

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&winner),
        Some(json!({"action": "claim"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(
        &app,
        Method::POST,
        &uri,
        Some(&loser),
        Some(json!({"action": "claim"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "STATE_CONFLICT");

    // The winner's assignment is untouched.
    let get_uri = format!(
        "/api/v1/pickups/{}",
        created["pickup_id"].as_str().expect("pickup id")
    );
    let (status, stored) = send(&app, Method::GET, &get_uri, Some(&winner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["assigned_agent_id"], winner_id.to_string());
}

// ============================================================================
// AUTH AND ROLE GATES
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let app = test_app();

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        None,
        Some(create_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, Method::GET, "/api/v1/pickups", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gates_on_route_groups() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);
    let agent = bearer(new_entity_id(), Role::Agent);
    let admin = bearer(new_entity_id(), Role::Admin);

    // Agents cannot file pickup requests.
    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&agent),
        Some(create_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "FORBIDDEN");

    // Requesters cannot browse the available listing.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/pickups/agent/available",
        Some(&requester),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins can.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/pickups/agent/available",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_action_is_requester_only() {
    let app = test_app();
    let requester_id = new_entity_id();
    let requester = bearer(requester_id, Role::Requester);
    let agent = bearer(new_entity_id(), Role::Agent);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(create_payload()),
    )
    .await;
    let uri = format!(
        "/api/v1/pickups/{}/transition",
        created["pickup_id"].as_str().expect("pickup id")
    );

    // The transition route admits any authenticated principal, but the cancel
    // action is checked against the caller's role.
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&agent),
        Some(json!({"action": "cancel"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancelled) = send(
        &app,
        Method::POST,
        &uri,
        Some(&requester),
        Some(json!({"action": "cancel"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
}

#[tokio::test]
async fn test_other_requester_cannot_read_or_rate() {
    let app = test_app();
    let owner = bearer(new_entity_id(), Role::Requester);
    let stranger = bearer(new_entity_id(), Role::Requester);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&owner),
        Some(create_payload()),
    )
    .await;
    let pickup_id = created["pickup_id"].as_str().expect("pickup id");

    let get_uri = format!("/api/v1/pickups/{}", pickup_id);
    let (status, _) = send(&app, Method::GET, &get_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let feedback_uri = format!("/api/v1/pickups/{}/feedback", pickup_id);
    let (status, _) = send(
        &app,
        Method::POST,
        &feedback_uri,
        Some(&stranger),
        Some(json!({"rating": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_feedback_before_completion_conflicts() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(create_payload()),
    )
    .await;
    let uri = format!(
        "/api/v1/pickups/{}/feedback",
        created["pickup_id"].as_str().expect("pickup id")
    );

    let (status, error) = send(
        &app,
        Method::POST,
        &uri,
        Some(&requester),
        Some(json!({"rating": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "STATE_CONFLICT");
}

// ============================================================================
// VALIDATION AT THE BOUNDARY
// ============================================================================

#[tokio::test]
async fn test_create_with_empty_items_fails_validation() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);

    let mut payload = create_payload();
    payload["items"] = json!([]);

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_create_with_zero_quantity_fails_validation() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);

    let mut payload = create_payload();
    payload["items"] = json!([{"category": "tv", "quantity": 0}]);

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_unknown_fields_are_rejected_at_deserialization() {
    let app = test_app();
    let requester = bearer(new_entity_id(), Role::Requester);

    let mut payload = create_payload();
    payload["owner_id"] = json!("11111111-1111-1111-1111-111111111111");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/pickups",
        Some(&requester),
        Some(payload),
    )
    .await;
    assert!(
        status.is_client_error(),
        "unknown field should be rejected, got {}",
        status
    );
}

// ============================================================================
// UNAUTHENTICATED SURFACE
// ============================================================================

#[tokio::test]
async fn test_health_and_openapi_need_no_auth() {
    let app = test_app();

    let (status, _) = send(&app, Method::GET, "/health/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "RECIRC API");
}
