use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_core::{AppResult, UserId};

use super::assignments::{NewUserRoleAssignment, UserRoleAssignment};
use super::roles::{NewRole, Role, RoleListQuery, UpdateRoleInput};
use super::templates::PermissionTemplate;

/// Repository port for role definitions.
///
/// Logically deleted roles are invisible to every read.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Creates a role. Fails with a conflict when the code is taken.
    async fn create_role(&self, role: NewRole) -> AppResult<Role>;

    /// Applies a partial update and returns the stored role.
    async fn update_role(&self, role_id: i64, input: UpdateRoleInput) -> AppResult<Role>;

    /// Marks a role deleted.
    async fn soft_delete_role(&self, role_id: i64) -> AppResult<()>;

    /// Finds a live role by id.
    async fn find_role(&self, role_id: i64) -> AppResult<Option<Role>>;

    /// Finds a live role by code.
    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>>;

    /// Lists live roles ordered by id.
    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Vec<Role>>;
}

/// Repository port for user-role assignment rows.
///
/// An assignment is active until it is revoked, including after its expiry
/// time has passed and before the expiry sweep has run. Callers that grant
/// access must check [`UserRoleAssignment::is_expired_at`] themselves.
#[async_trait]
pub trait UserRoleRepository: Send + Sync {
    /// Finds the active assignment of a user-role pair.
    async fn find_active_assignment(
        &self,
        user_id: UserId,
        role_id: i64,
    ) -> AppResult<Option<UserRoleAssignment>>;

    /// Stores a new active assignment. Fails with a conflict when the pair is
    /// already active.
    async fn create_assignment(
        &self,
        assignment: NewUserRoleAssignment,
    ) -> AppResult<UserRoleAssignment>;

    /// Revokes one assignment, returning false when it was not active.
    async fn revoke_assignment(
        &self,
        assignment_id: i64,
        revoked_by: Option<UserId>,
    ) -> AppResult<bool>;

    /// Counts active assignments of a role.
    async fn count_active_for_role(&self, role_id: i64) -> AppResult<u64>;

    /// Lists active assignments of a user.
    async fn list_active_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>>;

    /// Lists active assignments of a role.
    async fn list_active_for_role(&self, role_id: i64) -> AppResult<Vec<UserRoleAssignment>>;

    /// Lists active assignments whose expiry is at or before `now`.
    async fn list_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<UserRoleAssignment>>;
}

/// Repository port for the read-only permission template catalog.
#[async_trait]
pub trait PermissionTemplateRepository: Send + Sync {
    /// Lists templates, optionally restricted to one domain kind.
    async fn list_templates(&self, domain: Option<&str>) -> AppResult<Vec<PermissionTemplate>>;
}
