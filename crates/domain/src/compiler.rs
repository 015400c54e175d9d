use std::collections::BTreeSet;

use crate::{PermissionTree, PolicyRule};

/// Compiles a role's permission tree into flat allow rules.
///
/// Every granted leaf yields `(role_code, domain, resource, action, allow)`.
/// The output is sorted and free of duplicates, so two trees granting the
/// same leaves in a different order compile to the same rules.
#[must_use]
pub fn compile_permission_tree(role_code: &str, tree: &PermissionTree) -> Vec<PolicyRule> {
    tree.granted_leaves()
        .map(|leaf| PolicyRule::allow(role_code, leaf.domain, leaf.resource, leaf.action))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
