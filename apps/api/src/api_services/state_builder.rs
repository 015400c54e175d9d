use std::sync::Arc;

use sqlx::PgPool;
use vigil_application::{
    AuditRepository, EnforcementEngine, PermissionTemplateRepository, PermissionTemplateService,
    PolicySyncService, RoleAssignmentService, RoleRepository, RoleService, RuleStore,
    UserRoleRepository,
};
use vigil_core::AppError;
use vigil_infrastructure::{
    PostgresAuditRepository, PostgresPermissionTemplateRepository, PostgresRoleRepository,
    PostgresRuleStore, PostgresUserRoleRepository,
};

use crate::api_config::ApiConfig;
use crate::route_table::api_route_permissions;
use crate::state::AppState;

/// Port implementations the services are wired against.
pub struct AuthzPorts {
    pub roles: Arc<dyn RoleRepository>,
    pub assignments: Arc<dyn UserRoleRepository>,
    pub rule_store: Arc<dyn RuleStore>,
    pub templates: Arc<dyn PermissionTemplateRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
}

impl AuthzPorts {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
            assignments: Arc::new(PostgresUserRoleRepository::new(pool.clone())),
            rule_store: Arc::new(PostgresRuleStore::new(pool.clone())),
            templates: Arc::new(PostgresPermissionTemplateRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool)),
        }
    }
}

pub fn build_app_state(ports: AuthzPorts, config: &ApiConfig) -> Result<AppState, AppError> {
    let permission_template_service = PermissionTemplateService::new(ports.templates);

    let role_service = RoleService::new(
        ports.roles.clone(),
        ports.assignments.clone(),
        ports.rule_store.clone(),
        permission_template_service.clone(),
        ports.audit_repository.clone(),
        config.super_admin_role_code.as_str(),
    );
    let role_assignment_service = RoleAssignmentService::new(
        ports.roles.clone(),
        ports.assignments.clone(),
        ports.rule_store.clone(),
        ports.audit_repository,
    );
    let policy_sync_service = PolicySyncService::new(ports.rule_store.clone());
    let enforcement_engine = EnforcementEngine::new(
        ports.rule_store,
        ports.assignments,
        ports.roles,
        config.super_admin_role_code.as_str(),
    );

    Ok(AppState {
        role_service,
        role_assignment_service,
        permission_template_service,
        policy_sync_service,
        enforcement_engine,
        route_permissions: Arc::new(api_route_permissions()?),
        unmatched_route_policy: config.unmatched_route_policy,
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
