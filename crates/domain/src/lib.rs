//! Policy model, compiler and decision rules.

#![forbid(unsafe_code)]

mod authz_domain;
mod check;
mod compiler;
mod decision;
mod permission_tree;
mod role;
mod rule;
mod security;

pub use authz_domain::AuthzDomain;
pub use check::{CheckRequest, CheckResult, WILDCARD_RESOURCE_ID};
pub use compiler::compile_permission_tree;
pub use decision::Decision;
pub use permission_tree::{
    ActionPermission, DomainPermissions, PermissionLeaf, PermissionTree, ResourcePermissions,
};
pub use role::{RoleCode, RoleDomain};
pub use rule::{GroupRule, PolicyEffect, PolicyRule, Rule, RuleRecord, RuleType};
pub use security::AuditAction;
