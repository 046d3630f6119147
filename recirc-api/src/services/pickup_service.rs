//! Pickup Service
//!
//! Business logic for pickup request operations. Each mutating operation
//! follows the same shape: load a snapshot, compute the complete next state
//! through a pure transition method, then issue a single conditional write
//! keyed on the status the computation started from. No lock is held across
//! the repository await; a competing writer surfaces as a conflict on the
//! conditional write and is never retried here.

use chrono::Utc;
use recirc_core::{
    Feedback, PickupId, PickupRequest, PickupStatus, RecircError, Role, StorageError,
};
use recirc_storage::PickupRepository;

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::types::{CreatePickupRequest, PickupTransitionRequest, SubmitFeedbackRequest};

/// Create a new pickup request owned by the calling requester.
pub async fn create_pickup(
    repo: &dyn PickupRepository,
    principal: &Principal,
    req: CreatePickupRequest,
) -> ApiResult<PickupRequest> {
    let pickup = PickupRequest::new(
        principal.user_id,
        req.items,
        req.scheduled_date,
        req.scheduled_time,
        req.address,
        Utc::now(),
    )
    .map_err(RecircError::from)?;

    repo.pickup_insert(&pickup).await?;

    tracing::info!(
        pickup_id = %pickup.pickup_id,
        owner_id = %pickup.owner_id,
        "Pickup request created"
    );
    Ok(pickup)
}

/// List pickup requests owned by the calling requester.
pub async fn list_owned(
    repo: &dyn PickupRepository,
    principal: &Principal,
) -> ApiResult<Vec<PickupRequest>> {
    Ok(repo.pickup_list_by_owner(principal.user_id).await?)
}

/// List all pending pickup requests, unfiltered by owner.
pub async fn list_available(repo: &dyn PickupRepository) -> ApiResult<Vec<PickupRequest>> {
    Ok(repo.pickup_list_by_status(PickupStatus::Pending).await?)
}

/// List pickup requests assigned to the calling agent.
pub async fn list_assigned(
    repo: &dyn PickupRepository,
    principal: &Principal,
) -> ApiResult<Vec<PickupRequest>> {
    Ok(repo.pickup_list_by_agent(principal.user_id).await?)
}

/// Fetch a single pickup request, enforcing read access.
///
/// Readable by the owner, the assigned agent, any agent while the request is
/// still pending (it is visible in the available listing anyway), and
/// admins.
pub async fn get_pickup(
    repo: &dyn PickupRepository,
    principal: &Principal,
    id: PickupId,
) -> ApiResult<PickupRequest> {
    let pickup = repo
        .pickup_get(id)
        .await?
        .ok_or_else(|| ApiError::pickup_not_found(id))?;

    ensure_read_access(principal, &pickup)?;
    Ok(pickup)
}

fn ensure_read_access(principal: &Principal, pickup: &PickupRequest) -> ApiResult<()> {
    let allowed = match principal.role {
        Role::Admin => true,
        Role::Agent => {
            pickup.is_assigned_to(principal.user_id) || pickup.status == PickupStatus::Pending
        }
        Role::Requester => pickup.owner_id == principal.user_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Not authorized to view this pickup request",
        ))
    }
}

/// The role a transition action is reserved for.
fn action_role(req: &PickupTransitionRequest) -> Role {
    match req {
        PickupTransitionRequest::Claim
        | PickupTransitionRequest::Start
        | PickupTransitionRequest::Complete { .. } => Role::Agent,
        PickupTransitionRequest::Cancel => Role::Requester,
    }
}

/// Apply a lifecycle transition to a pickup request.
///
/// The caller's role is checked against the requested action before the
/// entity is loaded. The conditional write is keyed on the status the
/// snapshot had; losing that race yields the same 409 an illegal transition
/// produces, and the decision to retry belongs to the caller.
pub async fn apply_transition(
    repo: &dyn PickupRepository,
    principal: &Principal,
    id: PickupId,
    req: PickupTransitionRequest,
) -> ApiResult<PickupRequest> {
    let required = action_role(&req);
    if principal.role != required {
        return Err(ApiError::forbidden(format!(
            "Only a {} may perform this transition",
            required
        )));
    }

    let current = repo
        .pickup_get(id)
        .await?
        .ok_or_else(|| ApiError::pickup_not_found(id))?;
    let expected_status = current.status;

    let now = Utc::now();
    let next = match req {
        PickupTransitionRequest::Claim => current.claim(principal.user_id, now),
        PickupTransitionRequest::Start => current.start(principal.user_id, now),
        PickupTransitionRequest::Complete { closing_note } => {
            current.complete(principal.user_id, closing_note, now)
        }
        PickupTransitionRequest::Cancel => current.cancel(principal.user_id, now),
    }
    .map_err(RecircError::from)?;

    match repo.pickup_update(&next, expected_status).await {
        Ok(()) => {
            tracing::info!(
                pickup_id = %next.pickup_id,
                from = %expected_status,
                to = %next.status,
                actor = %principal.user_id,
                "Pickup transition applied"
            );
            Ok(next)
        }
        Err(RecircError::Storage(StorageError::Conflict { actual, .. })) => {
            tracing::debug!(
                pickup_id = %id,
                expected = %expected_status,
                actual = %actual,
                "Pickup transition lost a concurrent race"
            );
            Err(ApiError::state_conflict(format!(
                "Pickup request is no longer {}, found {}",
                expected_status, actual
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Record owner feedback on a completed pickup.
pub async fn submit_feedback(
    repo: &dyn PickupRepository,
    principal: &Principal,
    id: PickupId,
    req: SubmitFeedbackRequest,
) -> ApiResult<PickupRequest> {
    let feedback = Feedback::new(req.rating, req.comment).map_err(RecircError::from)?;

    let current = repo
        .pickup_get(id)
        .await?
        .ok_or_else(|| ApiError::pickup_not_found(id))?;
    let expected_status = current.status;

    let next = current
        .record_feedback(principal.user_id, feedback, Utc::now())
        .map_err(RecircError::from)?;

    repo.pickup_update(&next, expected_status).await?;

    tracing::info!(
        pickup_id = %next.pickup_id,
        owner_id = %principal.user_id,
        "Pickup feedback recorded"
    );
    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================
