// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Authenticated user representation extracted from bearer tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Authenticated user information extracted from a verified JWT.
///
/// This is the primary type used throughout the application to represent
/// the authenticated caller. The identity service mints tokens whose `sub`
/// is the platform user id; the role rides along as a custom claim.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Email address carried in the token
    pub email: String,

    /// User's role
    pub role: Role,

    /// Token expiration (Unix timestamp, used for validation, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Check if this user may adjudicate payments and withdrawals.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "user_123".to_string(),
            email: "user@example.com".to_string(),
            role,
            expires_at: 0,
        }
    }

    #[test]
    fn is_admin_follows_role() {
        assert!(user(Role::Admin).is_admin());
        assert!(user(Role::SuperAdmin).is_admin());
        assert!(!user(Role::Student).is_admin());
    }

    #[test]
    fn serialization_skips_expiry() {
        let json = serde_json::to_value(user(Role::Student)).unwrap();
        assert_eq!(json["user_id"], "user_123");
        assert_eq!(json["role"], "student");
        assert!(json.get("expires_at").is_none());
    }
}
