use async_trait::async_trait;
use vigil_core::AppResult;
use vigil_domain::{GroupRule, PolicyEffect, PolicyRule};

/// Lookup key for the policy rules relevant to one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyQuery {
    /// User subject followed by the user's effective role codes.
    pub subjects: Vec<String>,
    /// Concrete request domain and its kind.
    pub domains: Vec<String>,
    /// Instance object and resource type.
    pub objects: Vec<String>,
    /// Requested action.
    pub action: String,
}

impl PolicyQuery {
    /// Returns whether a rule falls inside this query.
    #[must_use]
    pub fn matches(&self, rule: &PolicyRule) -> bool {
        rule.action == self.action
            && self.subjects.contains(&rule.subject)
            && self.domains.contains(&rule.domain)
            && self.objects.contains(&rule.object)
    }
}

/// Persistent set of policy and group rules.
///
/// Reads never block each other. Policy replacement for one subject is a
/// single atomic step: concurrent readers observe either the old or the new
/// complete rule set.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Replaces every policy rule whose subject is `subject` with `rules`.
    async fn replace_policy_rules(&self, subject: &str, rules: &[PolicyRule]) -> AppResult<()>;

    /// Lists stored policy rules of one subject.
    async fn list_policy_rules(&self, subject: &str) -> AppResult<Vec<PolicyRule>>;

    /// Returns the effects of all policy rules matching the query.
    async fn matching_policy_effects(&self, query: &PolicyQuery) -> AppResult<Vec<PolicyEffect>>;

    /// Adds a group rule, returning false when it already existed.
    async fn add_group_rule(&self, rule: &GroupRule) -> AppResult<bool>;

    /// Removes a group rule, returning false when it was absent.
    async fn remove_group_rule(&self, rule: &GroupRule) -> AppResult<bool>;

    /// Removes every group rule naming the role, in any domain.
    async fn remove_group_rules_for_role(&self, role: &str) -> AppResult<u64>;

    /// Lists group rules of one user subject across all domains.
    async fn list_group_rules_for_user(&self, user: &str) -> AppResult<Vec<GroupRule>>;
}
