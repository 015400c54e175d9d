use std::sync::Arc;

use vigil_application::{CreateRoleInput, PermissionTemplate, UnmatchedRoutePolicy};
use vigil_core::{UserId, UserIdentity};
use vigil_domain::{PermissionTree, RoleDomain};
use vigil_infrastructure::{
    InMemoryAuditRepository, InMemoryPermissionTemplateRepository, InMemoryRoleRepository,
    InMemoryRuleStore, InMemoryUserRoleRepository,
};

use crate::api_config::ApiConfig;
use crate::api_services::{AuthzPorts, build_app_state};
use crate::state::AppState;

pub const BOOTSTRAP_TOKEN: &str = "bootstrap-secret";

pub fn user(id: i64) -> UserId {
    UserId::new(id).unwrap_or_else(|_| unreachable!())
}

pub fn identity(id: i64) -> UserIdentity {
    UserIdentity::new(user(id), format!("User {id}"))
}

fn template(id: i64, domain: &str, resource: &str, action: &str) -> PermissionTemplate {
    PermissionTemplate {
        id,
        template_code: format!("{domain}.{resource}.{action}"),
        domain: domain.to_owned(),
        resource: resource.to_owned(),
        resource_name: resource.to_owned(),
        action: action.to_owned(),
        action_name: action.to_owned(),
        is_default: action == "list",
        sort_order: i32::try_from(id).unwrap_or_default(),
        is_active: true,
    }
}

fn catalog() -> Vec<PermissionTemplate> {
    [
        ("global", "role", "list"),
        ("global", "role", "read"),
        ("global", "role", "create"),
        ("global", "role", "update"),
        ("global", "role", "delete"),
        ("global", "role", "sync"),
        ("global", "user_role", "list"),
        ("global", "user_role", "assign"),
        ("global", "user_role", "remove"),
        ("global", "permission_template", "list"),
        ("global", "permission", "check"),
        ("workspace", "workflow", "list"),
        ("workspace", "workflow", "create"),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (domain, resource, action))| {
        template(
            i64::try_from(index).unwrap_or_default() + 1,
            domain,
            resource,
            action,
        )
    })
    .collect()
}

pub fn test_config(unmatched_route_policy: UnmatchedRoutePolicy) -> ApiConfig {
    ApiConfig {
        migrate_only: false,
        database_url: String::new(),
        frontend_url: "http://localhost:3000".to_owned(),
        bootstrap_token: BOOTSTRAP_TOKEN.to_owned(),
        api_host: "127.0.0.1".to_owned(),
        api_port: 0,
        cookie_secure: false,
        super_admin_role_code: "super_admin".to_owned(),
        unmatched_route_policy,
        expiry_sweep_interval: None,
    }
}

pub fn in_memory_state(unmatched_route_policy: UnmatchedRoutePolicy) -> AppState {
    let ports = AuthzPorts {
        roles: Arc::new(InMemoryRoleRepository::new()),
        assignments: Arc::new(InMemoryUserRoleRepository::new()),
        rule_store: Arc::new(InMemoryRuleStore::new()),
        templates: Arc::new(InMemoryPermissionTemplateRepository::new(catalog())),
        audit_repository: Arc::new(InMemoryAuditRepository::new()),
    };

    build_app_state(ports, &test_config(unmatched_route_policy))
        .unwrap_or_else(|_| unreachable!())
}

/// Creates a global role from a tree literal and assigns it to the user.
pub async fn grant_role(state: &AppState, user_id: i64, code: &str, tree_json: &str) {
    let admin = identity(1);
    let permissions = PermissionTree::from_json(tree_json).unwrap_or_else(|_| unreachable!());

    let role = state
        .role_service
        .create_role(
            &admin,
            CreateRoleInput {
                code: code.to_owned(),
                name: code.to_owned(),
                domain: RoleDomain::Global,
                space_role_type: None,
                permissions,
                description: None,
            },
        )
        .await;
    let Ok(role) = role else {
        panic!("failed to create role '{code}' in test");
    };

    let assigned = state
        .role_assignment_service
        .assign_user_to_role(&admin, user(user_id), role.id, None)
        .await;
    assert!(assigned.is_ok());
}

/// Assigns the seeded super admin role to the user.
pub async fn grant_super_admin(state: &AppState, user_id: i64) {
    let Ok(role) = state.role_service.seed_builtin_roles().await else {
        panic!("failed to seed builtin roles in test");
    };

    let assigned = state
        .role_assignment_service
        .assign_user_to_role(&identity(1), user(user_id), role.id, None)
        .await;
    assert!(assigned.is_ok());
}

pub const ROLE_LIST_TREE: &str = r#"[{"domain":"global","resources":[{"resource":"role","actions":[{"action":"list","is_default":1},{"action":"create","is_default":0}]}]}]"#;
