use std::sync::Arc;

use vigil_application::{
    EnforcementEngine, PermissionTemplateService, PolicySyncService, RoleAssignmentService,
    RoleService, RoutePermissionTable, UnmatchedRoutePolicy,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_service: RoleService,
    pub role_assignment_service: RoleAssignmentService,
    pub permission_template_service: PermissionTemplateService,
    pub policy_sync_service: PolicySyncService,
    pub enforcement_engine: EnforcementEngine,
    pub route_permissions: Arc<RoutePermissionTable>,
    pub unmatched_route_policy: UnmatchedRoutePolicy,
    pub bootstrap_token: String,
}
