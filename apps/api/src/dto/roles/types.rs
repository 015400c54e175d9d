use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for role creation.
///
/// Omitted permissions default to the catalog's default actions.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub code: String,
    pub name: String,
    pub domain: Option<String>,
    pub space_role_type: Option<String>,
    #[ts(type = "unknown")]
    pub permissions: Option<serde_json::Value>,
    pub description: Option<String>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub space_role_type: Option<String>,
    pub is_disabled: Option<bool>,
    #[ts(type = "unknown")]
    pub permissions: Option<serde_json::Value>,
}

/// Query parameters for role listing.
#[derive(Debug, Default, Deserialize)]
pub struct RoleListParams {
    pub domain: Option<String>,
    pub keyword: Option<String>,
    pub include_disabled: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub domain: String,
    pub space_role_type: Option<String>,
    pub is_super_admin: bool,
    pub is_builtin: bool,
    pub is_disabled: bool,
    #[ts(type = "unknown")]
    pub permissions: serde_json::Value,
    pub description: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of an explicit role resync.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-sync-response.ts"
)]
pub struct RoleSyncResponse {
    pub role_id: i64,
    pub rule_count: usize,
}

/// API representation of one compiled policy rule.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/policy-rule-response.ts"
)]
pub struct PolicyRuleResponse {
    pub subject: String,
    pub domain: String,
    pub object: String,
    pub action: String,
    pub effect: String,
}

/// API representation of a user-role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-role-assignment-response.ts"
)]
pub struct UserRoleAssignmentResponse {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub assigned_by: Option<i64>,
    pub assigned_at: String,
    pub expired_at: Option<String>,
}

/// API representation of a role held by a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assigned-role-response.ts"
)]
pub struct AssignedRoleResponse {
    pub role: RoleResponse,
    pub assignment: UserRoleAssignmentResponse,
}

/// Incoming payload for assigning a role to a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-user-role-request.ts"
)]
pub struct AssignUserRoleRequest {
    pub user_id: i64,
    pub role_id: i64,
    /// RFC 3339 expiry timestamp.
    pub expired_at: Option<String>,
}

/// Incoming payload for removing a role from a user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/remove-user-role-request.ts"
)]
pub struct RemoveUserRoleRequest {
    pub user_id: i64,
    pub role_id: i64,
}

/// Outcome of a single role removal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/remove-user-role-response.ts"
)]
pub struct RemoveUserRoleResponse {
    pub removed: bool,
}

/// Incoming payload for assigning a role to many users.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-assign-user-roles-request.ts"
)]
pub struct BatchAssignUserRolesRequest {
    pub user_ids: Vec<i64>,
    pub role_id: i64,
    /// RFC 3339 expiry timestamp applied to every assignment.
    pub expired_at: Option<String>,
}

/// Incoming payload for removing a role from many users.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-remove-user-roles-request.ts"
)]
pub struct BatchRemoveUserRolesRequest {
    pub user_ids: Vec<i64>,
    pub role_id: i64,
}

/// Outcome of a batch role removal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-remove-user-roles-response.ts"
)]
pub struct BatchRemoveUserRolesResponse {
    pub removed: usize,
}
