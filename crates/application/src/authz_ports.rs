mod assignments;
mod audit;
mod repositories;
mod roles;
mod rules;
mod templates;

pub use assignments::{AssignedRole, NewUserRoleAssignment, UserRoleAssignment};
pub use audit::{AuditEvent, AuditRepository};
pub use repositories::{PermissionTemplateRepository, RoleRepository, UserRoleRepository};
pub use roles::{CreateRoleInput, NewRole, Role, RoleListQuery, UpdateRoleInput};
pub use rules::{PolicyQuery, RuleStore};
pub use templates::PermissionTemplate;
