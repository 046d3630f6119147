//! Pickup request entity and its lifecycle state machine
//!
//! A `PickupRequest` is created by a requester, claimed and serviced by a
//! recycling agent, and finally rated by its owner. Every transition method
//! is a pure function: it checks its guards against an in-memory snapshot
//! and returns an updated copy, leaving the input untouched. Persistence of
//! the result is the caller's concern, which keeps guard evaluation free of
//! I/O and makes lost races detectable at the storage boundary.

use crate::entities::{Address, Feedback, PickupItem};
use crate::enums::PickupStatus;
use crate::error::{LifecycleError, ValidationError};
use crate::identity::{new_entity_id, PickupId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A request to collect electronic waste from a requester's address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PickupRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub pickup_id: PickupId,
    /// The requester who filed the request. Never changes.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub owner_id: UserId,
    pub items: Vec<PickupItem>,
    pub status: PickupStatus,
    /// Set once when an agent claims the request, never cleared or reassigned.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent_id: Option<UserId>,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub address: Address,
    /// Agent-supplied message, set on the transition into completed.
    pub closing_note: Option<String>,
    pub feedback: Option<Feedback>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl PickupRequest {
    /// Create a new pending pickup request, validating field constraints.
    ///
    /// The first failing constraint is reported. Checked in order: at least
    /// one item, each quantity at least 1, schedule fields present, all
    /// address subfields present.
    pub fn new(
        owner_id: UserId,
        items: Vec<PickupItem>,
        scheduled_date: String,
        scheduled_time: String,
        address: Address,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "items".to_string(),
            });
        }
        for item in &items {
            item.validate()?;
        }
        if scheduled_date.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "scheduled_date".to_string(),
            });
        }
        if scheduled_time.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "scheduled_time".to_string(),
            });
        }
        address.validate()?;

        Ok(Self {
            pickup_id: new_entity_id(),
            owner_id,
            items,
            status: PickupStatus::Pending,
            assigned_agent_id: None,
            scheduled_date,
            scheduled_time,
            address,
            closing_note: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check whether the given agent is the one this request is assigned to.
    pub fn is_assigned_to(&self, agent_id: UserId) -> bool {
        self.assigned_agent_id == Some(agent_id)
    }

    /// Claim a pending request for the given agent.
    ///
    /// The request must still be pending. The agent becomes the assigned
    /// agent; assignment is permanent.
    pub fn claim(&self, agent_id: UserId, now: Timestamp) -> Result<Self, LifecycleError> {
        if self.status != PickupStatus::Pending {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: PickupStatus::Assigned,
            });
        }

        let mut next = self.clone();
        next.status = PickupStatus::Assigned;
        next.assigned_agent_id = Some(agent_id);
        next.updated_at = now;
        Ok(next)
    }

    /// Begin servicing an assigned request.
    ///
    /// Only the assigned agent may start, and only from `assigned`.
    pub fn start(&self, agent_id: UserId, now: Timestamp) -> Result<Self, LifecycleError> {
        if self.status != PickupStatus::Assigned {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: PickupStatus::InProgress,
            });
        }
        if !self.is_assigned_to(agent_id) {
            return Err(LifecycleError::NotAssignedAgent);
        }

        let mut next = self.clone();
        next.status = PickupStatus::InProgress;
        next.updated_at = now;
        Ok(next)
    }

    /// Complete a request, optionally recording a closing note.
    ///
    /// Only the assigned agent may complete. Completing directly from
    /// `assigned` without passing through `in-progress` is allowed.
    pub fn complete(
        &self,
        agent_id: UserId,
        closing_note: Option<String>,
        now: Timestamp,
    ) -> Result<Self, LifecycleError> {
        if !matches!(
            self.status,
            PickupStatus::Assigned | PickupStatus::InProgress
        ) {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: PickupStatus::Completed,
            });
        }
        if !self.is_assigned_to(agent_id) {
            return Err(LifecycleError::NotAssignedAgent);
        }

        let mut next = self.clone();
        next.status = PickupStatus::Completed;
        next.closing_note = closing_note;
        next.updated_at = now;
        Ok(next)
    }

    /// Cancel a request that no agent has claimed yet.
    ///
    /// Only the owner may cancel, and only while still pending.
    pub fn cancel(&self, caller_id: UserId, now: Timestamp) -> Result<Self, LifecycleError> {
        if self.status != PickupStatus::Pending {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: PickupStatus::Cancelled,
            });
        }
        if self.owner_id != caller_id {
            return Err(LifecycleError::NotOwner);
        }

        let mut next = self.clone();
        next.status = PickupStatus::Cancelled;
        next.updated_at = now;
        Ok(next)
    }

    /// Record owner feedback on a completed pickup.
    ///
    /// Later calls overwrite earlier feedback; there is no single-write lock.
    pub fn record_feedback(
        &self,
        caller_id: UserId,
        feedback: Feedback,
        now: Timestamp,
    ) -> Result<Self, LifecycleError> {
        if self.owner_id != caller_id {
            return Err(LifecycleError::NotOwner);
        }
        if self.status != PickupStatus::Completed {
            return Err(LifecycleError::FeedbackUnavailable {
                status: self.status,
            });
        }

        let mut next = self.clone();
        next.feedback = Some(feedback);
        next.updated_at = now;
        Ok(next)
    }
}
