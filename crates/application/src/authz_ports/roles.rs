use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_core::UserId;
use vigil_domain::{PermissionTree, RoleCode, RoleDomain};

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: i64,
    /// Unique immutable code, used as the rule subject.
    pub code: RoleCode,
    /// Display name.
    pub name: String,
    /// Scope the role is defined for.
    pub domain: RoleDomain,
    /// Space role classification, for space roles.
    pub space_role_type: Option<String>,
    /// Marks the platform-wide override role.
    ///
    /// Checks match the configured super admin role code, not this flag.
    /// Seeding refuses to start when a flagged role carries another code, so
    /// the two always name the same role.
    pub is_super_admin: bool,
    /// System-managed role that rejects edits.
    pub is_builtin: bool,
    /// Disabled roles cannot be assigned.
    pub is_disabled: bool,
    /// Editable permission tree.
    pub permissions: PermissionTree,
    /// Optional description.
    pub description: Option<String>,
    /// Creator, absent for seeded roles.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Requested role code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Scope of the role.
    pub domain: RoleDomain,
    /// Space role classification.
    pub space_role_type: Option<String>,
    /// Initial permission tree.
    pub permissions: PermissionTree,
    /// Optional description.
    pub description: Option<String>,
}

/// Validated role row handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Role code.
    pub code: RoleCode,
    /// Display name.
    pub name: String,
    /// Scope of the role.
    pub domain: RoleDomain,
    /// Space role classification.
    pub space_role_type: Option<String>,
    /// Super-admin marker.
    pub is_super_admin: bool,
    /// Builtin marker.
    pub is_builtin: bool,
    /// Initial permission tree.
    pub permissions: PermissionTree,
    /// Optional description.
    pub description: Option<String>,
    /// Creator.
    pub created_by: Option<UserId>,
}

/// Partial role update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New space role classification.
    pub space_role_type: Option<String>,
    /// Enables or disables assignment.
    pub is_disabled: Option<bool>,
    /// Replacement permission tree; triggers a rule resync.
    pub permissions: Option<PermissionTree>,
}

/// Query parameters for role listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleListQuery {
    /// Optional scope filter.
    pub domain: Option<RoleDomain>,
    /// Case-insensitive substring of code or name.
    pub keyword: Option<String>,
    /// Whether disabled roles are returned.
    pub include_disabled: bool,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl Default for RoleListQuery {
    fn default() -> Self {
        Self {
            domain: None,
            keyword: None,
            include_disabled: true,
            limit: 100,
            offset: 0,
        }
    }
}

impl RoleListQuery {
    /// Returns whether a role passes the filters, ignoring pagination.
    #[must_use]
    pub fn matches(&self, role: &Role) -> bool {
        if self.domain.is_some_and(|domain| domain != role.domain) {
            return false;
        }

        if !self.include_disabled && role.is_disabled {
            return false;
        }

        match self.keyword.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                role.code.as_str().contains(keyword.as_str())
                    || role.name.to_lowercase().contains(keyword.as_str())
            }
        }
    }
}
