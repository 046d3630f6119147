//! Axum Middleware for Authentication and Authorization
//!
//! This module provides Axum middleware that:
//! - Authenticates requests from the Authorization: Bearer header
//! - Injects the resolved Principal into request extensions
//! - Gates route groups on statically declared role sets
//! - Returns 401 for unauthenticated requests
//! - Returns 403 for principals whose role is outside the route's set
//!
//! Authentication failures short-circuit before any handler runs, so no
//! entity is ever loaded for an unauthenticated or ineligible caller.

use crate::auth::{authenticate, AuthConfig, Principal};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use recirc_core::Role;
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    /// Create new middleware state with the given auth configuration.
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

/// Statically declared role set for a route group.
///
/// An empty set means authentication only, no role restriction.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [Role]);

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Axum middleware for authentication.
///
/// Resolves the bearer credential to a Principal and injects it into request
/// extensions. Returns 401 if resolution fails.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let principal =
        authenticate(&state.auth_config, auth_header).map_err(AuthMiddlewareError)?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Axum middleware gating a route group on a role set.
///
/// Pure decision over the already-resolved Principal and the route's
/// declared roles; must be layered inside `auth_middleware`.
pub async fn role_gate_middleware(
    State(RequiredRoles(allowed)): State<RequiredRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let principal = extract_principal(&request).map_err(AuthMiddlewareError)?;

    if !principal.is_allowed(allowed) {
        tracing::debug!(
            user_id = %principal.user_id,
            role = %principal.role,
            ?allowed,
            "Role gate denied request"
        );
        return Err(AuthMiddlewareError(ApiError::forbidden(
            "Access denied: insufficient permissions",
        )));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for the authenticated principal.
///
/// Implements `FromRequestParts`, allowing handlers to require
/// authentication through their signature. The `auth_middleware` must be
/// applied to the route for this extractor to succeed.
#[derive(Debug, Clone)]
pub struct PrincipalExtractor(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .map(PrincipalExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "Principal not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for PrincipalExtractor {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Extract the Principal from request extensions.
pub fn extract_principal(request: &Request) -> ApiResult<&Principal> {
    request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::unauthorized("Principal missing from request"))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_token, JwtSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use recirc_core::new_entity_id;
    use tower::ServiceExt; // for `oneshot`

    fn test_auth_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.jwt_secret =
            JwtSecret::new("test_secret".to_string()).expect("test secret should be valid");
        config
    }

    fn test_app(allowed: &'static [Role]) -> Router {
        let auth_state = AuthMiddlewareState::new(test_auth_config());

        Router::new()
            .route("/protected", get(|| async { "Protected resource" }))
            .layer(middleware::from_fn_with_state(
                RequiredRoles(allowed),
                role_gate_middleware,
            ))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    fn bearer(role: Role) -> String {
        let token =
            issue_token(&test_auth_config(), new_entity_id(), role).expect("token should sign");
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_middleware_without_authentication() -> Result<(), String> {
        let app = test_app(&[]);

        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_jwt() -> Result<(), String> {
        let app = test_app(&[]);

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", bearer(Role::Requester))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_jwt() -> Result<(), String> {
        let app = test_app(&[]);

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "Bearer invalid.jwt.token")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_auth_header() -> Result<(), String> {
        let app = test_app(&[]);

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "NotBearer token")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_gate_allows_listed_role() -> Result<(), String> {
        let app = test_app(&[Role::Agent, Role::Admin]);

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", bearer(Role::Agent))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_gate_denies_unlisted_role() -> Result<(), String> {
        let app = test_app(&[Role::Agent]);

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", bearer(Role::Requester))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_role_set_is_authentication_only() -> Result<(), String> {
        let app = test_app(&[]);

        for role in [Role::Requester, Role::Agent, Role::Admin] {
            let request = Request::builder()
                .uri("/protected")
                .header("authorization", bearer(role))
                .body(Body::empty())
                .map_err(|e| e.to_string())?;

            let response = app
                .clone()
                .oneshot(request)
                .await
                .map_err(|e| format!("Request failed: {:?}", e))?;

            assert_eq!(response.status(), StatusCode::OK);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_principal_extractor_without_middleware() -> Result<(), String> {
        async fn handler(PrincipalExtractor(_principal): PrincipalExtractor) -> String {
            "Should not reach here".to_string()
        }

        // Router WITHOUT auth middleware
        let app = Router::new().route("/unprotected", get(handler));

        let request = Request::builder()
            .uri("/unprotected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn test_principal_extractor_with_valid_auth() -> Result<(), String> {
        async fn handler(principal: PrincipalExtractor) -> String {
            format!("User: {}, Role: {}", principal.user_id, principal.role)
        }

        let auth_state = AuthMiddlewareState::new(test_auth_config());
        let app = Router::new()
            .route("/protected", get(handler))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

        let user_id = new_entity_id();
        let token = issue_token(&test_auth_config(), user_id, Role::Agent)
            .expect("token should sign");

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| format!("Failed to read body: {:?}", e))?;
        let body_str = String::from_utf8(body.to_vec())
            .map_err(|e| format!("Invalid UTF-8 body: {}", e))?;

        assert!(body_str.contains(&format!("User: {}", user_id)));
        assert!(body_str.contains("Role: agent"));
        Ok(())
    }
}
