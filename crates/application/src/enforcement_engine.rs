use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};
use vigil_core::{AppError, AppResult, UserId};
use vigil_domain::{AuthzDomain, CheckRequest, CheckResult, Decision, GroupRule};

use crate::authz_ports::{PolicyQuery, RoleRepository, RuleStore, UserRoleRepository};

/// Application service answering permission checks from the rule store.
///
/// Evaluation only reads from the store, so any number of checks may run
/// concurrently against one engine. Global memberships backed by a lapsed
/// assignment are ignored even before the expiry sweep revokes them.
#[derive(Clone)]
pub struct EnforcementEngine {
    rule_store: Arc<dyn RuleStore>,
    assignments: Arc<dyn UserRoleRepository>,
    roles: Arc<dyn RoleRepository>,
    super_admin_role_code: String,
}

impl EnforcementEngine {
    /// Creates an engine that short-circuits for `super_admin_role_code`.
    #[must_use]
    pub fn new(
        rule_store: Arc<dyn RuleStore>,
        assignments: Arc<dyn UserRoleRepository>,
        roles: Arc<dyn RoleRepository>,
        super_admin_role_code: impl Into<String>,
    ) -> Self {
        Self {
            rule_store,
            assignments,
            roles,
            super_admin_role_code: super_admin_role_code.into(),
        }
    }

    /// Returns the configured super-admin role code.
    #[must_use]
    pub fn super_admin_role_code(&self) -> &str {
        self.super_admin_role_code.as_str()
    }

    /// Decides one request.
    ///
    /// Store failures are returned as errors and never produce an allow.
    pub async fn check(&self, request: &CheckRequest) -> AppResult<CheckResult> {
        let decision = self.evaluate(request).await?;

        debug!(
            user_id = %request.user_id,
            resource = %request.resource,
            resource_id = %request.resource_id,
            action = %request.action,
            domain = %request.domain,
            allowed = decision.is_allowed(),
            reason = decision.reason(),
            "permission evaluated"
        );

        Ok(decision.into())
    }

    /// Decides several requests independently.
    ///
    /// An item that fails to evaluate is reported as denied and does not
    /// affect the others.
    pub async fn batch_check(&self, requests: &[CheckRequest]) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let result = match self.check(request).await {
                Ok(result) => result,
                Err(AppError::Validation(message)) => {
                    warn!(
                        user_id = %request.user_id,
                        error = %message,
                        "batch check item rejected"
                    );
                    CheckResult::invalid_request(message)
                }
                Err(error) => {
                    error!(user_id = %request.user_id, error = %error, "batch check item failed");
                    CheckResult::internal_error(error)
                }
            };
            results.push(result);
        }

        results
    }

    /// Fails with `Forbidden` unless the request is allowed.
    pub async fn require(&self, request: &CheckRequest) -> AppResult<()> {
        let result = self.check(request).await?;
        if result.allowed {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' may not '{}' on '{}' in domain '{}': {}",
            request.user_id,
            request.action,
            request.resource,
            if request.domain.is_empty() {
                "global"
            } else {
                request.domain.as_str()
            },
            result.reason
        )))
    }

    async fn evaluate(&self, request: &CheckRequest) -> AppResult<Decision> {
        if request.resource.trim().is_empty() || request.action.trim().is_empty() {
            return Err(AppError::Validation(
                "resource and action are required".to_owned(),
            ));
        }

        let domain = request.authz_domain()?;
        let subject = request.user_id.subject();

        let memberships = self
            .rule_store
            .list_group_rules_for_user(subject.as_str())
            .await?
            .into_iter()
            .filter(|rule| rule.applies_to(&domain))
            .collect::<Vec<_>>();
        let lapsed = self.lapsed_role_codes(request.user_id, &memberships).await?;
        let roles = memberships
            .into_iter()
            .filter(|rule| !(is_global_membership(rule) && lapsed.contains(&rule.role)))
            .map(|rule| rule.role)
            .collect::<BTreeSet<_>>();

        if roles.contains(self.super_admin_role_code.as_str()) {
            return Ok(Decision::evaluate(true, std::iter::empty()));
        }

        let mut subjects = Vec::with_capacity(roles.len() + 1);
        subjects.push(subject);
        subjects.extend(roles);

        let query = PolicyQuery {
            subjects,
            domains: domain.policy_domains(),
            objects: request.objects(),
            action: request.action.clone(),
        };
        let effects = self.rule_store.matching_policy_effects(&query).await?;

        Ok(Decision::evaluate(false, effects))
    }

    /// Role codes whose assignment to the user has passed its expiry.
    async fn lapsed_role_codes(
        &self,
        user_id: UserId,
        memberships: &[GroupRule],
    ) -> AppResult<BTreeSet<String>> {
        let mut codes = BTreeSet::new();
        if !memberships.iter().any(is_global_membership) {
            return Ok(codes);
        }

        let now = Utc::now();
        for assignment in self.assignments.list_active_for_user(user_id).await? {
            if !assignment.is_expired_at(now) {
                continue;
            }
            if let Some(role) = self.roles.find_role(assignment.role_id).await? {
                codes.insert(role.code.into());
            }
        }

        Ok(codes)
    }
}

fn is_global_membership(rule: &GroupRule) -> bool {
    rule.applies_to(&AuthzDomain::Global)
}
