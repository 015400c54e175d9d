use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use vigil_core::{AppError, AppResult, UserId, UserIdentity};
use vigil_domain::{AuditAction, AuthzDomain, GroupRule, RoleDomain};

use crate::authz_ports::{
    AssignedRole, AuditEvent, AuditRepository, NewUserRoleAssignment, Role, RoleRepository,
    RuleStore, UserRoleAssignment, UserRoleRepository,
};

const ASSIGNMENT_RESOURCE_TYPE: &str = "authz_user_role";
const SYSTEM_SUBJECT: &str = "system";

/// Application service managing who holds which role.
///
/// Global assignments are mirrored as domain-agnostic group rules; domain
/// memberships are written as group rules only.
#[derive(Clone)]
pub struct RoleAssignmentService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn UserRoleRepository>,
    rule_store: Arc<dyn RuleStore>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAssignmentService {
    /// Creates a new assignment service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn UserRoleRepository>,
        rule_store: Arc<dyn RuleStore>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            roles,
            assignments,
            rule_store,
            audit_repository,
        }
    }

    /// Assigns a global role to a user.
    ///
    /// Re-assigning an active pair returns the existing assignment.
    pub async fn assign_user_to_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: i64,
        expired_at: Option<DateTime<Utc>>,
    ) -> AppResult<UserRoleAssignment> {
        let now = Utc::now();
        validate_expiry(expired_at, now)?;
        let role = self.assignable_role(role_id).await?;
        self.assign_one(actor, &role, user_id, expired_at, now).await
    }

    /// Revokes a user's role. Returns false when nothing was assigned.
    pub async fn remove_user_from_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: i64,
    ) -> AppResult<bool> {
        let role = self.require_role(role_id).await?;
        self.remove_one(actor, &role, user_id).await
    }

    /// Assigns a global role to several users.
    pub async fn batch_assign_users_to_role(
        &self,
        actor: &UserIdentity,
        user_ids: &[UserId],
        role_id: i64,
        expired_at: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let now = Utc::now();
        validate_expiry(expired_at, now)?;
        let role = self.assignable_role(role_id).await?;

        let mut assignments = Vec::with_capacity(user_ids.len());
        for user_id in unique_users(user_ids) {
            assignments.push(self.assign_one(actor, &role, user_id, expired_at, now).await?);
        }

        Ok(assignments)
    }

    /// Revokes a role from several users, returning how many were removed.
    pub async fn batch_remove_users_from_role(
        &self,
        actor: &UserIdentity,
        user_ids: &[UserId],
        role_id: i64,
    ) -> AppResult<usize> {
        let role = self.require_role(role_id).await?;

        let mut removed = 0;
        for user_id in unique_users(user_ids) {
            if self.remove_one(actor, &role, user_id).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Grants a role to a user inside one workspace or space.
    ///
    /// Called by the membership collaborator; no assignment row is kept.
    pub async fn add_domain_member(
        &self,
        user_id: UserId,
        role_code: &str,
        domain: &AuthzDomain,
    ) -> AppResult<bool> {
        let rule = self.membership_rule(user_id, role_code, domain).await?;
        let added = self.rule_store.add_group_rule(&rule).await?;
        if added {
            info!(%user_id, role_code, domain = %domain, "domain membership added");
        }
        Ok(added)
    }

    /// Revokes a role granted inside one workspace or space.
    pub async fn remove_domain_member(
        &self,
        user_id: UserId,
        role_code: &str,
        domain: &AuthzDomain,
    ) -> AppResult<bool> {
        if matches!(domain, AuthzDomain::Global) {
            return Err(AppError::Validation(
                "domain memberships require a workspace or space domain".to_owned(),
            ));
        }

        let removed = self
            .rule_store
            .remove_group_rule(&GroupRule::scoped(user_id.subject(), role_code, domain))
            .await?;
        if removed {
            info!(%user_id, role_code, domain = %domain, "domain membership removed");
        }
        Ok(removed)
    }

    /// Lists the global roles a user currently holds.
    pub async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<AssignedRole>> {
        let assignments = self.assignments.list_active_for_user(user_id).await?;

        let mut roles = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            match self.roles.find_role(assignment.role_id).await? {
                Some(role) => roles.push(AssignedRole { role, assignment }),
                None => warn!(
                    assignment_id = assignment.id,
                    role_id = assignment.role_id,
                    "assignment references a missing role"
                ),
            }
        }

        Ok(roles)
    }

    /// Lists active assignments of a role.
    pub async fn list_role_members(&self, role_id: i64) -> AppResult<Vec<UserRoleAssignment>> {
        self.require_role(role_id).await?;
        self.assignments.list_active_for_role(role_id).await
    }

    /// Revokes assignments whose expiry has passed and removes their rules.
    pub async fn revoke_expired_assignments(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let expired = self.assignments.list_expired(now).await?;

        let mut revoked = 0;
        for assignment in expired {
            if !self.assignments.revoke_assignment(assignment.id, None).await? {
                continue;
            }
            revoked += 1;

            let role_code = match self.roles.find_role(assignment.role_id).await? {
                Some(role) => {
                    self.rule_store
                        .remove_group_rule(&GroupRule::global(
                            assignment.user_id.subject(),
                            role.code.as_str(),
                        ))
                        .await?;
                    role.code.to_string()
                }
                None => assignment.role_id.to_string(),
            };

            self.audit_repository
                .append_event(AuditEvent {
                    subject: SYSTEM_SUBJECT.to_owned(),
                    action: AuditAction::UserRoleExpired,
                    resource_type: ASSIGNMENT_RESOURCE_TYPE.to_owned(),
                    resource_id: format!("{}:{}", assignment.user_id, assignment.role_id),
                    detail: Some(format!(
                        "role '{role_code}' expired for user {}",
                        assignment.user_id
                    )),
                })
                .await?;
        }

        if revoked > 0 {
            info!(revoked, "expired role assignments revoked");
        }
        Ok(revoked)
    }

    async fn assign_one(
        &self,
        actor: &UserIdentity,
        role: &Role,
        user_id: UserId,
        expired_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<UserRoleAssignment> {
        let rule = GroupRule::global(user_id.subject(), role.code.as_str());

        if let Some(existing) = self
            .assignments
            .find_active_assignment(user_id, role.id)
            .await?
        {
            if !existing.is_expired_at(now) {
                // Restores the rule if it was lost after the row was written.
                self.rule_store.add_group_rule(&rule).await?;
                return Ok(existing);
            }

            self.assignments
                .revoke_assignment(existing.id, Some(actor.user_id()))
                .await?;
        }

        let created = self
            .assignments
            .create_assignment(NewUserRoleAssignment {
                user_id,
                role_id: role.id,
                assigned_by: Some(actor.user_id()),
                expired_at,
            })
            .await;
        let assignment = match created {
            Ok(assignment) => assignment,
            // A concurrent assignment of the same pair won the insert.
            Err(AppError::Conflict(message)) => {
                let Some(existing) = self
                    .assignments
                    .find_active_assignment(user_id, role.id)
                    .await?
                else {
                    return Err(AppError::Conflict(message));
                };
                self.rule_store.add_group_rule(&rule).await?;
                return Ok(existing);
            }
            Err(error) => return Err(error),
        };
        self.rule_store.add_group_rule(&rule).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject(),
                action: AuditAction::UserRoleAssigned,
                resource_type: ASSIGNMENT_RESOURCE_TYPE.to_owned(),
                resource_id: format!("{user_id}:{}", role.id),
                detail: Some(format!("assigned role '{}' to user {user_id}", role.code)),
            })
            .await?;

        Ok(assignment)
    }

    async fn remove_one(
        &self,
        actor: &UserIdentity,
        role: &Role,
        user_id: UserId,
    ) -> AppResult<bool> {
        let rule = GroupRule::global(user_id.subject(), role.code.as_str());

        let Some(existing) = self
            .assignments
            .find_active_assignment(user_id, role.id)
            .await?
        else {
            self.rule_store.remove_group_rule(&rule).await?;
            return Ok(false);
        };

        self.assignments
            .revoke_assignment(existing.id, Some(actor.user_id()))
            .await?;
        self.rule_store.remove_group_rule(&rule).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject(),
                action: AuditAction::UserRoleRemoved,
                resource_type: ASSIGNMENT_RESOURCE_TYPE.to_owned(),
                resource_id: format!("{user_id}:{}", role.id),
                detail: Some(format!("removed role '{}' from user {user_id}", role.code)),
            })
            .await?;

        Ok(true)
    }

    async fn assignable_role(&self, role_id: i64) -> AppResult<Role> {
        let role = self.require_role(role_id).await?;

        if role.domain != RoleDomain::Global {
            return Err(AppError::Validation(format!(
                "domain mismatch: role '{}' is a {} role and cannot be assigned directly",
                role.code, role.domain
            )));
        }

        if role.is_disabled {
            return Err(AppError::Conflict(format!(
                "role disabled: role '{}' cannot be assigned",
                role.code
            )));
        }

        Ok(role)
    }

    async fn membership_rule(
        &self,
        user_id: UserId,
        role_code: &str,
        domain: &AuthzDomain,
    ) -> AppResult<GroupRule> {
        if matches!(domain, AuthzDomain::Global) {
            return Err(AppError::Validation(
                "domain memberships require a workspace or space domain".to_owned(),
            ));
        }

        let role = self
            .roles
            .find_role_by_code(role_code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_code}' does not exist")))?;
        if role.is_disabled {
            return Err(AppError::Conflict(format!(
                "role disabled: role '{}' cannot be granted",
                role.code
            )));
        }

        Ok(GroupRule::scoped(user_id.subject(), role.code.as_str(), domain))
    }

    async fn require_role(&self, role_id: i64) -> AppResult<Role> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} does not exist")))
    }
}

fn validate_expiry(expired_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AppResult<()> {
    match expired_at {
        Some(expired_at) if expired_at <= now => Err(AppError::Validation(format!(
            "expired_at {} is not in the future",
            expired_at.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

fn unique_users(user_ids: &[UserId]) -> Vec<UserId> {
    let mut seen = BTreeSet::new();
    user_ids
        .iter()
        .copied()
        .filter(|user_id| seen.insert(*user_id))
        .collect()
}
