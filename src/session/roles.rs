// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! User roles and the dashboard each role lands on.

use serde::{Deserialize, Serialize};

/// Platform roles.
///
/// ## Role Capabilities
///
/// - `Donor` - Browses requests and donates
/// - `Requester` - Creates and manages aid requests
/// - `Verifier` - Approves or rejects requests, votes on proposals
/// - `Admin` - Everything, including user management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Requester,
    Verifier,
    Admin,
}

/// Dashboard selected for a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    /// Open requests, own donation history, impact statistics.
    Donor,
    /// Own requests with progress, incoming donations.
    Requester,
    /// Pending verifications and open proposals.
    Verifier,
    /// Platform statistics, user management, data import/export.
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Donor, Role::Requester, Role::Verifier, Role::Admin];

    /// Stored/index representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Requester => "requester",
            Role::Verifier => "verifier",
            Role::Admin => "admin",
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "donor" => Some(Role::Donor),
            "requester" => Some(Role::Requester),
            "verifier" => Some(Role::Verifier),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        match self {
            Role::Donor => Dashboard::Donor,
            Role::Requester => Dashboard::Requester,
            Role::Verifier => Dashboard::Verifier,
            Role::Admin => Dashboard::Admin,
        }
    }

    pub fn can_create_requests(&self) -> bool {
        match self {
            Role::Requester | Role::Admin => true,
            Role::Donor | Role::Verifier => false,
        }
    }

    /// Approve/reject aid requests.
    pub fn can_verify(&self) -> bool {
        match self {
            Role::Verifier | Role::Admin => true,
            Role::Donor | Role::Requester => false,
        }
    }

    /// Create and vote on governance proposals.
    pub fn can_govern(&self) -> bool {
        match self {
            Role::Verifier | Role::Admin => true,
            Role::Donor | Role::Requester => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    /// New sign-ups start as donors.
    fn default() -> Self {
        Role::Donor
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("VERIFIER"), Some(Role::Verifier));
        assert_eq!(Role::parse(" Requester "), Some(Role::Requester));
        assert_eq!(Role::parse("client"), None);
    }

    #[test]
    fn every_role_has_its_own_dashboard() {
        assert_eq!(Role::Donor.dashboard(), Dashboard::Donor);
        assert_eq!(Role::Requester.dashboard(), Dashboard::Requester);
        assert_eq!(Role::Verifier.dashboard(), Dashboard::Verifier);
        assert_eq!(Role::Admin.dashboard(), Dashboard::Admin);
    }

    #[test]
    fn permissions_follow_role() {
        assert!(Role::Requester.can_create_requests());
        assert!(!Role::Donor.can_create_requests());
        assert!(Role::Verifier.can_verify());
        assert!(!Role::Requester.can_verify());
        assert!(Role::Admin.can_verify() && Role::Admin.can_govern());
        assert!(!Role::Donor.can_govern());
    }

    #[test]
    fn role_round_trips_through_display() {
        for role in Role::ALL {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
    }

    #[test]
    fn default_role_is_donor() {
        assert_eq!(Role::default(), Role::Donor);
    }
}
