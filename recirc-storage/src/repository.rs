//! Async repository trait for pickup request persistence.
//!
//! This trait is the boundary the lifecycle service talks to. Implementations
//! must ensure that `pickup_update` checks the expected prior status and the
//! replacement atomically for a given id, since that check is what serializes
//! two agents racing to claim the same pending request.

use async_trait::async_trait;
use recirc_core::{PickupId, PickupRequest, PickupStatus, RecircResult, UserId};

/// Async repository for pickup requests.
#[async_trait]
pub trait PickupRepository: Send + Sync {
    /// Insert a new pickup request.
    ///
    /// # Errors
    /// Returns `StorageError::DuplicateId` if the id already exists.
    async fn pickup_insert(&self, request: &PickupRequest) -> RecircResult<()>;

    /// Get a pickup request by ID.
    async fn pickup_get(&self, id: PickupId) -> RecircResult<Option<PickupRequest>>;

    /// List pickup requests filed by an owner, newest first.
    async fn pickup_list_by_owner(&self, owner_id: UserId) -> RecircResult<Vec<PickupRequest>>;

    /// List pickup requests in a given status, newest first.
    async fn pickup_list_by_status(
        &self,
        status: PickupStatus,
    ) -> RecircResult<Vec<PickupRequest>>;

    /// List pickup requests assigned to an agent, newest first.
    async fn pickup_list_by_agent(&self, agent_id: UserId) -> RecircResult<Vec<PickupRequest>>;

    /// Replace a stored pickup request, conditional on its current status.
    ///
    /// The stored entity is swapped for `request` only if its status still
    /// equals `expected_status`. Check and swap happen atomically per id.
    ///
    /// # Errors
    /// - `StorageError::NotFound` if the id is unknown.
    /// - `StorageError::Conflict` if the stored status no longer matches,
    ///   meaning a competing transition won the race.
    async fn pickup_update(
        &self,
        request: &PickupRequest,
        expected_status: PickupStatus,
    ) -> RecircResult<()>;
}
