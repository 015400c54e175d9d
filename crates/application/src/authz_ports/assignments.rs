use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_core::UserId;

use super::Role;

/// Active grant of a global role to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRoleAssignment {
    /// Stable assignment identifier.
    pub id: i64,
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: i64,
    /// Administrator that made the assignment.
    pub assigned_by: Option<UserId>,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Optional expiry; the assignment lapses at this instant.
    pub expired_at: Option<DateTime<Utc>>,
}

impl UserRoleAssignment {
    /// Returns whether the assignment has lapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at.is_some_and(|expired_at| expired_at <= now)
    }
}

/// Assignment row handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: i64,
    /// Administrator that made the assignment.
    pub assigned_by: Option<UserId>,
    /// Optional expiry.
    pub expired_at: Option<DateTime<Utc>>,
}

/// Role held by a user, with assignment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedRole {
    /// Role definition.
    pub role: Role,
    /// Assignment backing the grant.
    pub assignment: UserRoleAssignment,
}
