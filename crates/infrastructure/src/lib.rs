//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_permission_template_repository;
mod in_memory_role_repository;
mod in_memory_rule_store;
mod in_memory_user_role_repository;
mod postgres_audit_repository;
mod postgres_permission_template_repository;
mod postgres_role_repository;
mod postgres_rule_store;
mod postgres_user_role_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_permission_template_repository::InMemoryPermissionTemplateRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_rule_store::InMemoryRuleStore;
pub use in_memory_user_role_repository::InMemoryUserRoleRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_permission_template_repository::PostgresPermissionTemplateRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_rule_store::PostgresRuleStore;
pub use postgres_user_role_repository::PostgresUserRoleRepository;
