//! Enum types for RECIRC entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Role of a principal in the system.
///
/// Roles are embedded in the bearer credential at issuance time and resolved
/// per-request. They gate which operations a principal may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Files pickup requests and rates completed pickups
    Requester,
    /// Claims and services pending pickup requests
    Agent,
    /// Oversight role with read access across requests
    Admin,
}

impl Role {
    /// Convert to the wire/storage string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    /// Parse from the wire/storage string representation.
    pub fn from_db_str(s: &str) -> Result<Self, RoleParseError> {
        match s.to_lowercase().as_str() {
            "requester" => Ok(Role::Requester),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid role: {}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

/// Status of a pickup request.
///
/// Status moves only along the directed graph
/// `pending -> assigned -> in-progress -> completed`, plus
/// `pending -> cancelled`. All other edges are illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum PickupStatus {
    /// Filed by a requester, not yet claimed by an agent
    Pending,
    /// Claimed by an agent
    Assigned,
    /// Agent is actively servicing the pickup
    InProgress,
    /// Pickup finished; feedback becomes available to the owner
    Completed,
    /// Withdrawn by the owner before any agent claimed it
    Cancelled,
}

impl PickupStatus {
    /// Convert to the wire/storage string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Assigned => "assigned",
            PickupStatus::InProgress => "in-progress",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from the wire/storage string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PickupStatusParseError> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PickupStatus::Pending),
            "assigned" => Ok(PickupStatus::Assigned),
            "in-progress" => Ok(PickupStatus::InProgress),
            "completed" => Ok(PickupStatus::Completed),
            "cancelled" => Ok(PickupStatus::Cancelled),
            _ => Err(PickupStatusParseError(s.to_string())),
        }
    }

    /// Check if this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PickupStatus::Completed | PickupStatus::Cancelled)
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PickupStatus {
    type Err = PickupStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid pickup status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupStatusParseError(pub String);

impl fmt::Display for PickupStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid pickup status: {}", self.0)
    }
}

impl std::error::Error for PickupStatusParseError {}

/// Category of an electronic-waste item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Computer,
    Mobile,
    Tv,
    Printer,
    Other,
}

impl ItemCategory {
    /// Convert to the wire/storage string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ItemCategory::Computer => "computer",
            ItemCategory::Mobile => "mobile",
            ItemCategory::Tv => "tv",
            ItemCategory::Printer => "printer",
            ItemCategory::Other => "other",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Requester, Role::Agent, Role::Admin] {
            let parsed = Role::from_db_str(role.as_db_str()).expect("role should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::from_db_str("AGENT"), Ok(Role::Agent));
        assert_eq!("Requester".parse(), Ok(Role::Requester));
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!(Role::from_db_str("superuser").is_err());
        assert!(Role::from_db_str("").is_err());
    }

    #[test]
    fn test_pickup_status_round_trip() {
        for status in [
            PickupStatus::Pending,
            PickupStatus::Assigned,
            PickupStatus::InProgress,
            PickupStatus::Completed,
            PickupStatus::Cancelled,
        ] {
            let parsed =
                PickupStatus::from_db_str(status.as_db_str()).expect("status should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_pickup_status_serde_uses_kebab_case() {
        let json = serde_json::to_string(&PickupStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in-progress\"");

        let parsed: PickupStatus = serde_json::from_str("\"in-progress\"").expect("deserialize");
        assert_eq!(parsed, PickupStatus::InProgress);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PickupStatus::Completed.is_terminal());
        assert!(PickupStatus::Cancelled.is_terminal());
        assert!(!PickupStatus::Pending.is_terminal());
        assert!(!PickupStatus::Assigned.is_terminal());
        assert!(!PickupStatus::InProgress.is_terminal());
    }
}
