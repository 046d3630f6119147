//! Service layer for RECIRC API
//!
//! Business logic between route handlers and the repository.

pub mod pickup_service;
