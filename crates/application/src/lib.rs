//! Application services and ports.

#![forbid(unsafe_code)]

mod authz_ports;
mod enforcement_engine;
mod permission_template_service;
mod policy_sync_service;
mod role_assignment_service;
mod role_service;
mod route_permissions;

#[cfg(test)]
mod test_support;

pub use authz_ports::{
    AssignedRole, AuditEvent, AuditRepository, CreateRoleInput, NewRole, NewUserRoleAssignment,
    PermissionTemplate, PermissionTemplateRepository, PolicyQuery, Role, RoleListQuery,
    RoleRepository, RuleStore, UpdateRoleInput, UserRoleAssignment, UserRoleRepository,
};
pub use enforcement_engine::EnforcementEngine;
pub use permission_template_service::PermissionTemplateService;
pub use policy_sync_service::PolicySyncService;
pub use role_assignment_service::RoleAssignmentService;
pub use role_service::RoleService;
pub use route_permissions::{
    RouteDecision, RoutePermissionRule, RoutePermissionTable, RouteRequest, SPACE_HEADER,
    SPACE_QUERY_PARAM, UnmatchedRoutePolicy, WORKSPACE_HEADER, WORKSPACE_QUERY_PARAM,
    resolve_domain,
};
