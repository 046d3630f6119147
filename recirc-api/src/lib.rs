//! RECIRC API - REST API Layer
//!
//! This crate provides the HTTP service for the RECIRC e-waste pickup
//! coordination system. It exposes the pickup-request lifecycle over REST
//! (Axum) behind JWT bearer authentication with per-route role gates.
//!
//! Every operation flows auth middleware -> role gate -> service -> a single
//! conditional repository write, so concurrent transitions against the same
//! request resolve to exactly one winner.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use auth::{
    authenticate, issue_token, resolve_principal, validate_jwt_token, AuthConfig, Claims,
    FixedClock, JwtClock, JwtSecret, Principal, SystemClock,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{
    auth_middleware, extract_principal, role_gate_middleware, AuthMiddlewareState,
    PrincipalExtractor, RequiredRoles,
};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use types::*;
