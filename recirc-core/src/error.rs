//! Error types for RECIRC operations

use crate::{EntityId, PickupStatus};
use thiserror::Error;

/// Validation errors raised at entity construction time.
///
/// The first failing constraint is reported; callers receive exactly one
/// error per attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Lifecycle errors raised by transition guards.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition {
        from: PickupStatus,
        to: PickupStatus,
    },

    #[error("Pickup request is assigned to a different agent")]
    NotAssignedAgent,

    #[error("Pickup request belongs to a different requester")]
    NotOwner,

    #[error("Feedback requires a completed pickup, current status is {status}")]
    FeedbackUnavailable { status: PickupStatus },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Pickup request not found: {id}")]
    NotFound { id: EntityId },

    #[error("Pickup request already exists: {id}")]
    DuplicateId { id: EntityId },

    #[error("Conditional update on {id} lost: expected status {expected}, found {actual}")]
    Conflict {
        id: EntityId,
        expected: PickupStatus,
        actual: PickupStatus,
    },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Master error type for all RECIRC core errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecircError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for core operations.
pub type RecircResult<T> = Result<T, RecircError>;
