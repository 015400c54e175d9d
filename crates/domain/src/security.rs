use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role's attributes or permissions change.
    RoleUpdated,
    /// Emitted when a role is logically deleted.
    RoleDeleted,
    /// Emitted when a role's compiled rules are rebuilt on request.
    RoleSynced,
    /// Emitted when a user is assigned a role.
    UserRoleAssigned,
    /// Emitted when a user's role assignment is revoked.
    UserRoleRemoved,
    /// Emitted when an assignment lapses at its expiry time.
    UserRoleExpired,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "authz.role.created",
            Self::RoleUpdated => "authz.role.updated",
            Self::RoleDeleted => "authz.role.deleted",
            Self::RoleSynced => "authz.role.synced",
            Self::UserRoleAssigned => "authz.user_role.assigned",
            Self::UserRoleRemoved => "authz.user_role.removed",
            Self::UserRoleExpired => "authz.user_role.expired",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditAction] = &[
            AuditAction::RoleCreated,
            AuditAction::RoleUpdated,
            AuditAction::RoleDeleted,
            AuditAction::RoleSynced,
            AuditAction::UserRoleAssigned,
            AuditAction::UserRoleRemoved,
            AuditAction::UserRoleExpired,
        ];

        ALL
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn audit_action_roundtrip_storage_value() {
        for action in AuditAction::all() {
            let restored = AuditAction::from_str(action.as_str());
            assert!(matches!(restored, Ok(value) if value == *action));
        }
    }

    #[test]
    fn unknown_audit_action_is_rejected() {
        assert!(AuditAction::from_str("authz.role.renamed").is_err());
    }
}
