use std::sync::Arc;

use tracing::info;
use vigil_core::{AppError, AppResult};
use vigil_domain::{PermissionTree, PolicyRule, compile_permission_tree};

use crate::authz_ports::RuleStore;

/// Application service that keeps a role's compiled rules in step with its
/// permission tree.
#[derive(Clone)]
pub struct PolicySyncService {
    rule_store: Arc<dyn RuleStore>,
}

impl PolicySyncService {
    /// Creates a new sync service from a rule store implementation.
    #[must_use]
    pub fn new(rule_store: Arc<dyn RuleStore>) -> Self {
        Self { rule_store }
    }

    /// Parses a stored tree and replaces the role's policy rules with it.
    ///
    /// A malformed tree fails before the store is touched.
    pub async fn sync(&self, role_code: &str, tree_json: &str) -> AppResult<usize> {
        let tree = PermissionTree::from_json(tree_json)?;
        self.sync_tree(role_code, &tree).await
    }

    /// Compiles a tree and replaces the role's policy rules with the result.
    ///
    /// Returns the number of rules now stored for the role.
    pub async fn sync_tree(&self, role_code: &str, tree: &PermissionTree) -> AppResult<usize> {
        let role_code = role_code.trim();
        if role_code.is_empty() {
            return Err(AppError::Validation(
                "role code is required to sync policies".to_owned(),
            ));
        }

        let rules = compile_permission_tree(role_code, tree);
        self.rule_store
            .replace_policy_rules(role_code, rules.as_slice())
            .await?;

        info!(role_code, rule_count = rules.len(), "role policies synced");
        Ok(rules.len())
    }

    /// Removes every policy rule of the role.
    pub async fn revoke_all(&self, role_code: &str) -> AppResult<()> {
        self.sync_tree(role_code, &PermissionTree::empty())
            .await
            .map(|_| ())
    }

    /// Lists the compiled rules currently stored for a role.
    pub async fn policies_for(&self, role_code: &str) -> AppResult<Vec<PolicyRule>> {
        let mut rules = self.rule_store.list_policy_rules(role_code).await?;
        rules.sort();
        rules.dedup();
        Ok(rules)
    }
}
