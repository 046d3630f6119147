//! Pickup-related API types

use recirc_core::{Address, PickupItem, PickupRequest};
use serde::{Deserialize, Serialize};

/// Request to create a pickup request.
///
/// The owner is taken from the authenticated principal, never from the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct CreatePickupRequest {
    /// Items to collect, at least one
    pub items: Vec<PickupItem>,
    /// Requested pickup date
    pub scheduled_date: String,
    /// Requested pickup time window
    pub scheduled_time: String,
    /// Address where the pickup takes place
    pub address: Address,
}

/// A lifecycle transition, one variant per operation kind.
///
/// Claim, start, and complete are agent operations; cancel belongs to the
/// owning requester. The service checks the caller's role against the
/// requested action before loading the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PickupTransitionRequest {
    /// Assign the calling agent to a pending request
    Claim,
    /// Begin servicing a request assigned to the calling agent
    Start,
    /// Finish a request assigned to the calling agent
    Complete {
        /// Message left for the requester, stored verbatim
        #[serde(default, skip_serializing_if = "Option::is_none")]
        closing_note: Option<String>,
    },
    /// Withdraw an unclaimed request (owner only)
    Cancel,
}

/// Request to record feedback on a completed pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct SubmitFeedbackRequest {
    /// Rating between 1 and 5 inclusive
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response containing a list of pickup requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListPickupsResponse {
    /// Pickup requests, newest first
    pub pickups: Vec<PickupRequest>,
    /// Total count
    pub total: i32,
}
