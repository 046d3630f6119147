//! RECIRC Core - Entity Types and Pickup Lifecycle
//!
//! Pure data structures plus the pickup-request state machine. All other
//! crates depend on this. Transition methods are pure functions over an
//! in-memory snapshot; no I/O happens here.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod pickup;

pub use entities::{Address, Feedback, PickupItem};
pub use enums::{
    ItemCategory, PickupStatus, PickupStatusParseError, Role, RoleParseError,
};
pub use error::{
    LifecycleError, RecircError, RecircResult, StorageError, ValidationError,
};
pub use identity::{new_entity_id, EntityId, PickupId, Timestamp, UserId};
pub use pickup::PickupRequest;
