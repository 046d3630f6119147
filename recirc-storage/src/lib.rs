//! RECIRC Storage - Repository Trait and In-Memory Implementation
//!
//! Defines the persistence abstraction for pickup requests. The repository
//! is the single serialization point for competing transitions: every write
//! is conditional on the status the caller computed against, so a lost race
//! surfaces as a conflict instead of a silent overwrite.

pub mod memory;
pub mod repository;

pub use memory::MemoryPickupRepository;
pub use repository::PickupRepository;
