use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vigil_application::{PolicyQuery, RuleStore};
use vigil_core::{AppError, AppResult};
use vigil_domain::{GroupRule, PolicyEffect, PolicyRule, RuleRecord};

/// In-memory rule store implementation.
///
/// Policy rules are grouped by subject so a replacement swaps one entry under
/// a single write guard.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    policies: RwLock<HashMap<String, Vec<PolicyRule>>>,
    groups: RwLock<BTreeSet<GroupRule>>,
}

impl InMemoryRuleStore {
    /// Creates an empty rule store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stores group rules with an explicit domain so equal memberships compare equal.
fn normalized(rule: &GroupRule) -> GroupRule {
    let record = RuleRecord::from(rule);
    GroupRule {
        user: record.v0,
        role: record.v1,
        domain: Some(record.v2),
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn replace_policy_rules(&self, subject: &str, rules: &[PolicyRule]) -> AppResult<()> {
        if let Some(rule) = rules.iter().find(|rule| rule.subject != subject) {
            return Err(AppError::Validation(format!(
                "policy rule subject '{}' does not match '{subject}'",
                rule.subject
            )));
        }

        let mut replacement = rules.to_vec();
        replacement.sort();
        replacement.dedup();

        let mut policies = self.policies.write().await;
        if replacement.is_empty() {
            policies.remove(subject);
        } else {
            policies.insert(subject.to_owned(), replacement);
        }

        Ok(())
    }

    async fn list_policy_rules(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        Ok(self
            .policies
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }

    async fn matching_policy_effects(&self, query: &PolicyQuery) -> AppResult<Vec<PolicyEffect>> {
        let policies = self.policies.read().await;

        Ok(query
            .subjects
            .iter()
            .filter_map(|subject| policies.get(subject))
            .flatten()
            .filter(|rule| query.matches(rule))
            .map(|rule| rule.effect)
            .collect())
    }

    async fn add_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        Ok(self.groups.write().await.insert(normalized(rule)))
    }

    async fn remove_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        Ok(self.groups.write().await.remove(&normalized(rule)))
    }

    async fn remove_group_rules_for_role(&self, role: &str) -> AppResult<u64> {
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|rule| rule.role != role);

        Ok(u64::try_from(before - groups.len()).unwrap_or_default())
    }

    async fn list_group_rules_for_user(&self, user: &str) -> AppResult<Vec<GroupRule>> {
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
