//! Middleware modules for RECIRC API
//!
//! - `auth`: credential resolution and the role-based access gate
//!
//! The auth middleware runs on every `/api/v1` route and injects the
//! resolved `Principal` into request extensions. Role gates are applied per
//! route group on top of it; both deny before any handler or entity load
//! runs.

mod auth;

pub use auth::{
    auth_middleware, extract_principal, role_gate_middleware, AuthMiddlewareError,
    AuthMiddlewareState, PrincipalExtractor, RequiredRoles,
};
