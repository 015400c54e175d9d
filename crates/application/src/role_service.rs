use std::sync::Arc;

use tracing::info;
use vigil_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use vigil_domain::{AuditAction, PermissionTree, RoleCode, RoleDomain};

use crate::authz_ports::{
    AuditEvent, AuditRepository, CreateRoleInput, NewRole, Role, RoleListQuery, RoleRepository,
    RuleStore, UpdateRoleInput, UserRoleRepository,
};
use crate::{PermissionTemplateService, PolicySyncService};

const ROLE_RESOURCE_TYPE: &str = "authz_role";

/// Application service for the role registry.
///
/// Every change to a role's permission tree is followed by a resync of the
/// role's compiled rules.
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn UserRoleRepository>,
    rule_store: Arc<dyn RuleStore>,
    policy_sync: PolicySyncService,
    templates: PermissionTemplateService,
    audit_repository: Arc<dyn AuditRepository>,
    super_admin_role_code: String,
}

impl RoleService {
    /// Creates a new role service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn UserRoleRepository>,
        rule_store: Arc<dyn RuleStore>,
        templates: PermissionTemplateService,
        audit_repository: Arc<dyn AuditRepository>,
        super_admin_role_code: impl Into<String>,
    ) -> Self {
        Self {
            policy_sync: PolicySyncService::new(rule_store.clone()),
            roles,
            assignments,
            rule_store,
            templates,
            audit_repository,
            super_admin_role_code: super_admin_role_code.into(),
        }
    }

    /// Creates a custom role and compiles its permissions.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let code = RoleCode::new(input.code.trim())?;
        let name = NonEmptyString::new(input.name.trim())?;
        if code.as_str() == self.super_admin_role_code {
            return Err(AppError::Conflict(format!(
                "role code '{code}' is reserved for the builtin super admin role"
            )));
        }
        if input.domain == RoleDomain::Global && input.space_role_type.is_some() {
            return Err(AppError::Validation(
                "space_role_type is only valid for space roles".to_owned(),
            ));
        }
        self.templates.validate_tree(&input.permissions).await?;

        let role = self
            .roles
            .create_role(NewRole {
                code,
                name: name.into(),
                domain: input.domain,
                space_role_type: input.space_role_type,
                is_super_admin: false,
                is_builtin: false,
                permissions: input.permissions,
                description: input.description,
                created_by: Some(actor.user_id()),
            })
            .await?;

        let rule_count = self
            .policy_sync
            .sync_tree(role.code.as_str(), &role.permissions)
            .await?;

        self.append_role_event(
            actor,
            AuditAction::RoleCreated,
            &role,
            format!("created role '{}' with {rule_count} rules", role.code),
        )
        .await?;

        Ok(role)
    }

    /// Updates a custom role. Rules are resynced only when permissions change.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: i64,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        let existing = self.require_role(role_id).await?;
        if existing.is_builtin {
            return Err(AppError::Conflict(format!(
                "builtin role '{}' cannot be modified",
                existing.code
            )));
        }

        if let Some(name) = &input.name {
            NonEmptyString::new(name.trim())?;
        }
        if existing.domain == RoleDomain::Global && input.space_role_type.is_some() {
            return Err(AppError::Validation(
                "space_role_type is only valid for space roles".to_owned(),
            ));
        }
        if let Some(permissions) = &input.permissions {
            self.templates.validate_tree(permissions).await?;
        }

        let permissions_changed = input.permissions.is_some();
        let role = self.roles.update_role(role_id, input).await?;

        let detail = if permissions_changed {
            let rule_count = self
                .policy_sync
                .sync_tree(role.code.as_str(), &role.permissions)
                .await?;
            format!("updated role '{}' and resynced {rule_count} rules", role.code)
        } else {
            format!("updated role '{}'", role.code)
        };

        self.append_role_event(actor, AuditAction::RoleUpdated, &role, detail)
            .await?;

        Ok(role)
    }

    /// Logically deletes an unused custom role and clears its rules.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: i64) -> AppResult<()> {
        let role = self.require_role(role_id).await?;
        if role.is_builtin {
            return Err(AppError::Conflict(format!(
                "builtin role '{}' cannot be deleted",
                role.code
            )));
        }

        let in_use = self.assignments.count_active_for_role(role_id).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is assigned to {in_use} users and cannot be deleted",
                role.code
            )));
        }

        // The row is hidden last; a failure above leaves the role deletable.
        self.policy_sync.revoke_all(role.code.as_str()).await?;
        let removed_memberships = self
            .rule_store
            .remove_group_rules_for_role(role.code.as_str())
            .await?;
        self.roles.soft_delete_role(role_id).await?;

        self.append_role_event(
            actor,
            AuditAction::RoleDeleted,
            &role,
            format!(
                "deleted role '{}' and removed {removed_memberships} domain memberships",
                role.code
            ),
        )
        .await
    }

    /// Returns one live role.
    pub async fn get_role(&self, role_id: i64) -> AppResult<Role> {
        self.require_role(role_id).await
    }

    /// Lists live roles.
    pub async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Vec<Role>> {
        self.roles.list_roles(query).await
    }

    /// Recompiles a role's rules from its stored tree.
    ///
    /// Builtin roles may be resynced; this is the repair path after manual
    /// rule edits.
    pub async fn resync_role(&self, actor: &UserIdentity, role_id: i64) -> AppResult<usize> {
        let role = self.require_role(role_id).await?;
        let rule_count = self
            .policy_sync
            .sync_tree(role.code.as_str(), &role.permissions)
            .await?;

        self.append_role_event(
            actor,
            AuditAction::RoleSynced,
            &role,
            format!("resynced {rule_count} rules for role '{}'", role.code),
        )
        .await?;

        Ok(rule_count)
    }

    /// Ensures the builtin super-admin role exists.
    pub async fn seed_builtin_roles(&self) -> AppResult<Role> {
        let global_roles = RoleListQuery {
            domain: Some(RoleDomain::Global),
            limit: usize::MAX,
            ..RoleListQuery::default()
        };
        if let Some(stray) = self
            .roles
            .list_roles(&global_roles)
            .await?
            .into_iter()
            .find(|role| role.is_super_admin && role.code.as_str() != self.super_admin_role_code)
        {
            return Err(AppError::Conflict(format!(
                "role '{}' is flagged super admin but the configured super admin role is '{}'",
                stray.code, self.super_admin_role_code
            )));
        }

        if let Some(role) = self
            .roles
            .find_role_by_code(self.super_admin_role_code.as_str())
            .await?
        {
            return Ok(role);
        }

        let role = self
            .roles
            .create_role(NewRole {
                code: RoleCode::new(self.super_admin_role_code.as_str())?,
                name: "Super Administrator".to_owned(),
                domain: RoleDomain::Global,
                space_role_type: None,
                is_super_admin: true,
                is_builtin: true,
                permissions: PermissionTree::empty(),
                description: Some("Bypasses every permission check.".to_owned()),
                created_by: None,
            })
            .await?;

        info!(role_code = %role.code, role_id = role.id, "seeded builtin super admin role");
        Ok(role)
    }

    async fn require_role(&self, role_id: i64) -> AppResult<Role> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} does not exist")))
    }

    async fn append_role_event(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        role: &Role,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject(),
                action,
                resource_type: ROLE_RESOURCE_TYPE.to_owned(),
                resource_id: role.id.to_string(),
                detail: Some(detail),
            })
            .await
    }
}
