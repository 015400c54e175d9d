use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use vigil_core::{AppError, AppResult, UserId, UserIdentity};
use vigil_domain::{GroupRule, PolicyEffect, PolicyRule, RuleRecord};

use crate::authz_ports::{
    AuditEvent, AuditRepository, NewRole, NewUserRoleAssignment, PermissionTemplate,
    PermissionTemplateRepository, PolicyQuery, Role, RoleListQuery, RoleRepository, RuleStore,
    UpdateRoleInput, UserRoleAssignment, UserRoleRepository,
};

pub fn user(id: i64) -> UserId {
    UserId::new(id).unwrap_or_else(|_| unreachable!())
}

pub fn actor() -> UserIdentity {
    UserIdentity::new(user(1), "Admin")
}

#[derive(Default)]
pub struct FakeRuleStore {
    policies: RwLock<Vec<PolicyRule>>,
    groups: RwLock<Vec<GroupRule>>,
    unavailable: AtomicBool,
}

impl FakeRuleStore {
    pub async fn insert_policy(&self, rule: PolicyRule) {
        self.policies.write().await.push(rule);
    }

    pub async fn policies(&self) -> Vec<PolicyRule> {
        self.policies.read().await.clone()
    }

    pub async fn groups(&self) -> Vec<GroupRule> {
        self.groups.read().await.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("rule store unavailable".to_owned()));
        }
        Ok(())
    }
}

fn same_group(left: &GroupRule, right: &GroupRule) -> bool {
    RuleRecord::from(left) == RuleRecord::from(right)
}

#[async_trait]
impl RuleStore for FakeRuleStore {
    async fn replace_policy_rules(&self, subject: &str, rules: &[PolicyRule]) -> AppResult<()> {
        self.ensure_available()?;
        let mut policies = self.policies.write().await;
        policies.retain(|rule| rule.subject != subject);
        policies.extend_from_slice(rules);
        Ok(())
    }

    async fn list_policy_rules(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        self.ensure_available()?;
        Ok(self
            .policies
            .read()
            .await
            .iter()
            .filter(|rule| rule.subject == subject)
            .cloned()
            .collect())
    }

    async fn matching_policy_effects(&self, query: &PolicyQuery) -> AppResult<Vec<PolicyEffect>> {
        self.ensure_available()?;
        Ok(self
            .policies
            .read()
            .await
            .iter()
            .filter(|rule| query.matches(rule))
            .map(|rule| rule.effect)
            .collect())
    }

    async fn add_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        self.ensure_available()?;
        let mut groups = self.groups.write().await;
        if groups.iter().any(|stored| same_group(stored, rule)) {
            return Ok(false);
        }
        groups.push(rule.clone());
        Ok(true)
    }

    async fn remove_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        self.ensure_available()?;
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|stored| !same_group(stored, rule));
        Ok(groups.len() != before)
    }

    async fn remove_group_rules_for_role(&self, role: &str) -> AppResult<u64> {
        self.ensure_available()?;
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|stored| stored.role != role);
        Ok((before - groups.len()) as u64)
    }

    async fn list_group_rules_for_user(&self, user: &str) -> AppResult<Vec<GroupRule>> {
        self.ensure_available()?;
        Ok(self
            .groups
            .read()
            .await
            .iter()
            .filter(|rule| rule.user == user)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeRoleRepository {
    roles: Mutex<Vec<(Role, bool)>>,
    next_id: AtomicI64,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles
            .iter()
            .any(|(stored, deleted)| !deleted && stored.code == role.code)
        {
            return Err(AppError::Conflict(format!(
                "role code '{}' already exists",
                role.code
            )));
        }

        let now = Utc::now();
        let stored = Role {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            code: role.code,
            name: role.name,
            domain: role.domain,
            space_role_type: role.space_role_type,
            is_super_admin: role.is_super_admin,
            is_builtin: role.is_builtin,
            is_disabled: false,
            permissions: role.permissions,
            description: role.description,
            created_by: role.created_by,
            created_at: now,
            updated_at: now,
        };
        roles.push((stored.clone(), false));
        Ok(stored)
    }

    async fn update_role(&self, role_id: i64, input: UpdateRoleInput) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let (role, _) = roles
            .iter_mut()
            .find(|(stored, deleted)| !deleted && stored.id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} does not exist")))?;

        if let Some(name) = input.name {
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = Some(description);
        }
        if let Some(space_role_type) = input.space_role_type {
            role.space_role_type = Some(space_role_type);
        }
        if let Some(is_disabled) = input.is_disabled {
            role.is_disabled = is_disabled;
        }
        if let Some(permissions) = input.permissions {
            role.permissions = permissions;
        }
        role.updated_at = Utc::now();
        Ok(role.clone())
    }

    async fn soft_delete_role(&self, role_id: i64) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        if let Some((_, deleted)) = roles.iter_mut().find(|(stored, _)| stored.id == role_id) {
            *deleted = true;
        }
        Ok(())
    }

    async fn find_role(&self, role_id: i64) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|(stored, deleted)| !deleted && stored.id == role_id)
            .map(|(stored, _)| stored.clone()))
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|(stored, deleted)| !deleted && stored.code.as_str() == code)
            .map(|(stored, _)| stored.clone()))
    }

    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|(stored, deleted)| !deleted && query.matches(stored))
            .map(|(stored, _)| stored.clone())
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

#[derive(Default)]
pub struct FakeUserRoleRepository {
    rows: Mutex<Vec<(UserRoleAssignment, bool)>>,
    next_id: AtomicI64,
    stale_lookups: AtomicUsize,
}

impl FakeUserRoleRepository {
    /// Makes the next active-assignment lookup miss, as if another writer
    /// inserted the row right after it.
    pub fn miss_next_lookup(&self) {
        self.stale_lookups.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn active(&self) -> Vec<UserRoleAssignment> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|(_, revoked)| !revoked)
            .map(|(row, _)| row.clone())
            .collect()
    }

    pub async fn insert_with_expiry(
        &self,
        user_id: UserId,
        role_id: i64,
        expired_at: DateTime<Utc>,
    ) -> UserRoleAssignment {
        let row = UserRoleAssignment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            role_id,
            assigned_by: None,
            assigned_at: expired_at - chrono::Duration::hours(1),
            expired_at: Some(expired_at),
        };
        self.rows.lock().await.push((row.clone(), false));
        row
    }
}

#[async_trait]
impl UserRoleRepository for FakeUserRoleRepository {
    async fn find_active_assignment(
        &self,
        user_id: UserId,
        role_id: i64,
    ) -> AppResult<Option<UserRoleAssignment>> {
        if self
            .stale_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok()
        {
            return Ok(None);
        }

        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|(row, revoked)| !revoked && row.user_id == user_id && row.role_id == role_id)
            .map(|(row, _)| row.clone()))
    }

    async fn create_assignment(
        &self,
        assignment: NewUserRoleAssignment,
    ) -> AppResult<UserRoleAssignment> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|(row, revoked)| {
            !revoked && row.user_id == assignment.user_id && row.role_id == assignment.role_id
        }) {
            return Err(AppError::Conflict("assignment already active".to_owned()));
        }

        let row = UserRoleAssignment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            assigned_by: assignment.assigned_by,
            assigned_at: Utc::now(),
            expired_at: assignment.expired_at,
        };
        rows.push((row.clone(), false));
        Ok(row)
    }

    async fn revoke_assignment(
        &self,
        assignment_id: i64,
        _revoked_by: Option<UserId>,
    ) -> AppResult<bool> {
        let mut rows = self.rows.lock().await;
        match rows
            .iter_mut()
            .find(|(row, revoked)| !revoked && row.id == assignment_id)
        {
            Some((_, revoked)) => {
                *revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_active_for_role(&self, role_id: i64) -> AppResult<u64> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|(row, revoked)| !revoked && row.role_id == role_id)
            .count() as u64)
    }

    async fn list_active_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .active()
            .await
            .into_iter()
            .filter(|row| row.user_id == user_id)
            .collect())
    }

    async fn list_active_for_role(&self, role_id: i64) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .active()
            .await
            .into_iter()
            .filter(|row| row.role_id == role_id)
            .collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .active()
            .await
            .into_iter()
            .filter(|row| row.is_expired_at(now))
            .collect())
    }
}

pub struct FakeTemplateRepository {
    templates: Vec<PermissionTemplate>,
}

impl Default for FakeTemplateRepository {
    fn default() -> Self {
        let entries = [
            ("global", "role", "Role", "list", "List", true, 1),
            ("global", "role", "Role", "create", "Create", false, 2),
            ("workspace", "workflow", "Workflow", "create", "Create", true, 2),
            ("workspace", "workflow", "Workflow", "delete", "Delete", false, 3),
            ("workspace", "workflow", "Workflow", "list", "List", true, 1),
            ("space", "document", "Document", "read", "Read", true, 1),
        ];

        Self {
            templates: entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    let (
                        domain,
                        resource,
                        resource_name,
                        action,
                        action_name,
                        is_default,
                        sort_order,
                    ) = entry;
                    PermissionTemplate {
                        id: index as i64 + 1,
                        template_code: format!("{domain}.{resource}.{action}"),
                        domain: domain.to_owned(),
                        resource: resource.to_owned(),
                        resource_name: resource_name.to_owned(),
                        action: action.to_owned(),
                        action_name: action_name.to_owned(),
                        is_default,
                        sort_order,
                        is_active: true,
                    }
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PermissionTemplateRepository for FakeTemplateRepository {
    async fn list_templates(&self, domain: Option<&str>) -> AppResult<Vec<PermissionTemplate>> {
        Ok(self
            .templates
            .iter()
            .filter(|template| domain.is_none_or(|domain| template.domain == domain))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl FakeAuditRepository {
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Fakes wired together the way the API composes the real adapters.
pub struct Fixture {
    pub rule_store: Arc<FakeRuleStore>,
    pub roles: Arc<FakeRoleRepository>,
    pub assignments: Arc<FakeUserRoleRepository>,
    pub templates: Arc<FakeTemplateRepository>,
    pub audit: Arc<FakeAuditRepository>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            rule_store: Arc::new(FakeRuleStore::default()),
            roles: Arc::new(FakeRoleRepository::default()),
            assignments: Arc::new(FakeUserRoleRepository::default()),
            templates: Arc::new(FakeTemplateRepository::default()),
            audit: Arc::new(FakeAuditRepository::default()),
        }
    }
}
