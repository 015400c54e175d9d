use chrono::{DateTime, SecondsFormat, Utc};
use vigil_application::{AssignedRole, Role, UserRoleAssignment};
use vigil_domain::PolicyRule;

use super::types::{
    AssignedRoleResponse, PolicyRuleResponse, RoleResponse, UserRoleAssignmentResponse,
};

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id,
            code: value.code.to_string(),
            name: value.name,
            domain: value.domain.as_str().to_owned(),
            space_role_type: value.space_role_type,
            is_super_admin: value.is_super_admin,
            is_builtin: value.is_builtin,
            is_disabled: value.is_disabled,
            permissions: serde_json::to_value(&value.permissions).unwrap_or_default(),
            description: value.description,
            created_by: value.created_by.map(|user_id| user_id.as_i64()),
            created_at: timestamp(value.created_at),
            updated_at: timestamp(value.updated_at),
        }
    }
}

impl From<UserRoleAssignment> for UserRoleAssignmentResponse {
    fn from(value: UserRoleAssignment) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id.as_i64(),
            role_id: value.role_id,
            assigned_by: value.assigned_by.map(|user_id| user_id.as_i64()),
            assigned_at: timestamp(value.assigned_at),
            expired_at: value.expired_at.map(timestamp),
        }
    }
}

impl From<AssignedRole> for AssignedRoleResponse {
    fn from(value: AssignedRole) -> Self {
        Self {
            role: RoleResponse::from(value.role),
            assignment: UserRoleAssignmentResponse::from(value.assignment),
        }
    }
}

impl From<PolicyRule> for PolicyRuleResponse {
    fn from(value: PolicyRule) -> Self {
        Self {
            subject: value.subject,
            domain: value.domain,
            object: value.object,
            action: value.action,
            effect: value.effect.as_str().to_owned(),
        }
    }
}
