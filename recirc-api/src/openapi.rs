//! OpenAPI Specification for the RECIRC API
//!
//! Generates the OpenAPI document from Rust types and route annotations
//! using utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, pickup};
use crate::types::{
    CreatePickupRequest, ListPickupsResponse, PickupTransitionRequest, SubmitFeedbackRequest,
};

use recirc_core::{Address, Feedback, ItemCategory, PickupItem, PickupRequest, PickupStatus, Role};

/// OpenAPI document for the RECIRC API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RECIRC API",
        version = "0.3.0",
        description = "Electronic-waste pickup coordination between requesters, recycling agents, and administrators",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "RECIRC", url = "https://recirc.app")
    ),
    servers(
        (url = "https://api.recirc.app", description = "Production"),
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Pickups", description = "Pickup request lifecycle - creation, claiming, servicing, and feedback"),
        (name = "Health", description = "Service health checks")
    ),
    paths(
        pickup::create_pickup,
        pickup::list_my_pickups,
        pickup::list_available_pickups,
        pickup::list_assigned_pickups,
        pickup::get_pickup,
        pickup::transition_pickup,
        pickup::submit_feedback,
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            PickupRequest,
            PickupItem,
            Address,
            Feedback,
            Role,
            PickupStatus,
            ItemCategory,
            CreatePickupRequest,
            PickupTransitionRequest,
            SubmitFeedbackRequest,
            ListPickupsResponse,
            ApiError,
            ErrorCode,
            health::HealthResponse,
            health::HealthStatus,
            health::HealthDetails,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer-token security scheme to the generated document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
