//! Status enums for user accounts.
//!
//! Values mirror the strings the backend stores. Unknown values deserialize to
//! an `Other` variant instead of failing, since the backend is the source of
//! truth and may add roles the storefront does not care about.

use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    /// Storefront customer. Every self-registered account gets this role.
    #[default]
    #[serde(rename = "Cliente")]
    Customer,
    /// Back-office administrator.
    #[serde(rename = "admin")]
    Admin,
    /// Back-office super administrator.
    #[serde(rename = "super_admin")]
    SuperAdmin,
    /// Any role this storefront does not know about.
    #[serde(other, skip_serializing)]
    Other,
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account can sign in and shop.
    #[default]
    Activo,
    /// Account is disabled.
    Inactivo,
    /// Any status this storefront does not know about.
    #[serde(other, skip_serializing)]
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(serde_json::to_string(&UserRole::Customer).unwrap(), "\"Cliente\"");
        let role: UserRole = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, UserRole::SuperAdmin);
    }

    #[test]
    fn test_unknown_values_are_tolerated() {
        let role: UserRole = serde_json::from_str("\"Vendedor\"").unwrap();
        assert_eq!(role, UserRole::Other);
        let status: UserStatus = serde_json::from_str("\"suspendido\"").unwrap();
        assert_eq!(status, UserStatus::Other);
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(serde_json::to_string(&UserStatus::Activo).unwrap(), "\"activo\"");
    }
}
