//! API request and response types
//!
//! Request payloads are strongly typed per operation. Creation and feedback
//! payloads reject unknown fields at the boundary; the transition payload is
//! a tagged variant per operation kind.

mod pickup;

pub use pickup::{
    CreatePickupRequest, ListPickupsResponse, PickupTransitionRequest, SubmitFeedbackRequest,
};
