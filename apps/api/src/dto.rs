mod common;
mod permissions;
mod roles;

pub use common::{BootstrapRequest, HealthResponse, UserIdentityResponse};
pub use permissions::{
    BatchCheckPermissionRequest, BatchCheckPermissionResponse, CheckPermissionRequest,
    CheckPermissionResponse, PermissionTemplateCatalogResponse, PermissionTemplateQuery,
    PermissionTemplateResponse,
};
pub use roles::{
    AssignUserRoleRequest, AssignedRoleResponse, BatchAssignUserRolesRequest,
    BatchRemoveUserRolesRequest, BatchRemoveUserRolesResponse, CreateRoleRequest,
    PolicyRuleResponse, RemoveUserRoleRequest, RemoveUserRoleResponse, RoleListParams,
    RoleResponse, RoleSyncResponse, UpdateRoleRequest, UserRoleAssignmentResponse,
};
