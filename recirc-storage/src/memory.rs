//! In-memory pickup repository backed by a concurrent map.
//!
//! DashMap's per-shard locking gives `pickup_update` its atomic
//! check-and-swap: the shard entry lock is held from the status comparison
//! through the replacement, so two concurrent claims on one pending request
//! yield exactly one winner.

use async_trait::async_trait;
use dashmap::DashMap;
use recirc_core::{
    PickupId, PickupRequest, PickupStatus, RecircResult, StorageError, UserId,
};

use crate::repository::PickupRepository;

/// In-memory implementation of [`PickupRepository`].
#[derive(Debug, Default)]
pub struct MemoryPickupRepository {
    pickups: DashMap<PickupId, PickupRequest>,
}

impl MemoryPickupRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests.
    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    /// Check whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }

    fn collect_sorted<F>(&self, mut predicate: F) -> Vec<PickupRequest>
    where
        F: FnMut(&PickupRequest) -> bool,
    {
        let mut matches: Vec<PickupRequest> = self
            .pickups
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first; pickup_id breaks created_at ties (UUIDv7 is
        // timestamp-sortable).
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.pickup_id.cmp(&a.pickup_id))
        });
        matches
    }
}

#[async_trait]
impl PickupRepository for MemoryPickupRepository {
    async fn pickup_insert(&self, request: &PickupRequest) -> RecircResult<()> {
        match self.pickups.entry(request.pickup_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StorageError::DuplicateId {
                id: request.pickup_id,
            }
            .into()),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn pickup_get(&self, id: PickupId) -> RecircResult<Option<PickupRequest>> {
        Ok(self.pickups.get(&id).map(|entry| entry.value().clone()))
    }

    async fn pickup_list_by_owner(&self, owner_id: UserId) -> RecircResult<Vec<PickupRequest>> {
        Ok(self.collect_sorted(|p| p.owner_id == owner_id))
    }

    async fn pickup_list_by_status(
        &self,
        status: PickupStatus,
    ) -> RecircResult<Vec<PickupRequest>> {
        Ok(self.collect_sorted(|p| p.status == status))
    }

    async fn pickup_list_by_agent(&self, agent_id: UserId) -> RecircResult<Vec<PickupRequest>> {
        Ok(self.collect_sorted(|p| p.assigned_agent_id == Some(agent_id)))
    }

    async fn pickup_update(
        &self,
        request: &PickupRequest,
        expected_status: PickupStatus,
    ) -> RecircResult<()> {
        // The shard lock from get_mut covers both the status check and the
        // swap, making this a compare-and-set keyed by id.
        let mut entry = self
            .pickups
            .get_mut(&request.pickup_id)
            .ok_or(StorageError::NotFound {
                id: request.pickup_id,
            })?;

        if entry.status != expected_status {
            return Err(StorageError::Conflict {
                id: request.pickup_id,
                expected: expected_status,
                actual: entry.status,
            }
            .into());
        }

        *entry.value_mut() = request.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recirc_core::{new_entity_id, Address, ItemCategory, PickupItem, RecircError};
    use std::sync::Arc;

    fn sample_request(owner_id: UserId) -> PickupRequest {
        PickupRequest::new(
            owner_id,
            vec![PickupItem {
                category: ItemCategory::Mobile,
                quantity: 2,
                description: None,
            }],
            "2025-06-01".to_string(),
            "14:30".to_string(),
            Address {
                street: "5 Harbor Way".to_string(),
                city: "Oakland".to_string(),
                state: "CA".to_string(),
                zip_code: "94607".to_string(),
                country: "US".to_string(),
            },
            Utc::now(),
        )
        .expect("sample request should validate")
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        let request = sample_request(new_entity_id());

        repo.pickup_insert(&request).await?;
        let fetched = repo.pickup_get(request.pickup_id).await?;

        assert_eq!(fetched, Some(request));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        let request = sample_request(new_entity_id());

        repo.pickup_insert(&request).await?;
        let err = repo.pickup_insert(&request).await.unwrap_err();

        assert!(matches!(
            err,
            RecircError::Storage(StorageError::DuplicateId { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_unknown_id_returns_none() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        assert_eq!(repo.pickup_get(new_entity_id()).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_by_owner_filters_and_sorts() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        let owner = new_entity_id();
        let other = new_entity_id();

        let first = sample_request(owner);
        let second = sample_request(owner);
        let unrelated = sample_request(other);

        repo.pickup_insert(&first).await?;
        repo.pickup_insert(&second).await?;
        repo.pickup_insert(&unrelated).await?;

        let owned = repo.pickup_list_by_owner(owner).await?;
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|p| p.owner_id == owner));
        assert!(owned[0].created_at >= owned[1].created_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_by_status_and_agent() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        let agent = new_entity_id();

        let pending = sample_request(new_entity_id());
        let claimed = sample_request(new_entity_id())
            .claim(agent, Utc::now())
            .expect("claim");

        repo.pickup_insert(&pending).await?;
        repo.pickup_insert(&claimed).await?;

        let available = repo.pickup_list_by_status(PickupStatus::Pending).await?;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].pickup_id, pending.pickup_id);

        let assigned = repo.pickup_list_by_agent(agent).await?;
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].pickup_id, claimed.pickup_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_requires_matching_status() -> RecircResult<()> {
        let repo = MemoryPickupRepository::new();
        let agent = new_entity_id();
        let request = sample_request(new_entity_id());
        repo.pickup_insert(&request).await?;

        let claimed = request.claim(agent, Utc::now()).expect("claim");
        repo.pickup_update(&claimed, PickupStatus::Pending).await?;

        // A second writer that still believes the request is pending loses.
        let stale = request.claim(new_entity_id(), Utc::now()).expect("claim");
        let err = repo
            .pickup_update(&stale, PickupStatus::Pending)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RecircError::Storage(StorageError::Conflict { .. })
        ));

        let stored = repo.pickup_get(request.pickup_id).await?.expect("stored");
        assert_eq!(stored.assigned_agent_id, Some(agent));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let repo = MemoryPickupRepository::new();
        let request = sample_request(new_entity_id());

        let err = repo
            .pickup_update(&request, PickupStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecircError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_have_one_winner() -> RecircResult<()> {
        let repo = Arc::new(MemoryPickupRepository::new());
        let request = sample_request(new_entity_id());
        repo.pickup_insert(&request).await?;

        let agent_a = new_entity_id();
        let agent_b = new_entity_id();

        let claim = |agent: UserId| {
            let repo = Arc::clone(&repo);
            let id = request.pickup_id;
            async move {
                let snapshot = repo.pickup_get(id).await?.expect("request exists");
                let claimed = snapshot
                    .claim(agent, Utc::now())
                    .map_err(RecircError::from)?;
                repo.pickup_update(&claimed, PickupStatus::Pending).await
            }
        };

        let (result_a, result_b) = tokio::join!(
            tokio::spawn(claim(agent_a)),
            tokio::spawn(claim(agent_b))
        );
        let result_a = result_a.expect("task a should not panic");
        let result_b = result_b.expect("task b should not panic");

        assert!(
            result_a.is_ok() ^ result_b.is_ok(),
            "exactly one claim must win, got {:?} and {:?}",
            result_a,
            result_b
        );

        let stored = repo.pickup_get(request.pickup_id).await?.expect("stored");
        assert_eq!(stored.status, PickupStatus::Assigned);
        let winner = if result_a.is_ok() { agent_a } else { agent_b };
        assert_eq!(stored.assigned_agent_id, Some(winner));
        Ok(())
    }
}
