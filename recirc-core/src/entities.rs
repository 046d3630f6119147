//! Value types carried by pickup requests

use crate::enums::ItemCategory;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A single electronic-waste item within a pickup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PickupItem {
    pub category: ItemCategory,
    /// Number of units, at least 1
    pub quantity: i32,
    pub description: Option<String>,
}

impl PickupItem {
    /// Validate the item's field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity < 1 {
            return Err(ValidationError::InvalidValue {
                field: "items.quantity".to_string(),
                reason: format!("must be at least 1, got {}", self.quantity),
            });
        }
        Ok(())
    }
}

/// Street address where a pickup takes place. All subfields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Address {
    /// Validate that every subfield is present and non-empty.
    ///
    /// Reports the first missing subfield only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("address.street", &self.street),
            ("address.city", &self.city),
            ("address.state", &self.state),
            ("address.zip_code", &self.zip_code),
            ("address.country", &self.country),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::RequiredFieldMissing {
                    field: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Requester feedback on a completed pickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Feedback {
    /// Rating between 1 and 5 inclusive
    pub rating: i32,
    pub comment: Option<String>,
}

impl Feedback {
    /// Create feedback, validating the rating range.
    pub fn new(rating: i32, comment: Option<String>) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::InvalidValue {
                field: "feedback.rating".to_string(),
                reason: format!("must be between 1 and 5, got {}", rating),
            });
        }
        Ok(Self { rating, comment })
    }
}
