mod conversions;
mod types;

pub use types::{
    AssignUserRoleRequest, AssignedRoleResponse, BatchAssignUserRolesRequest,
    BatchRemoveUserRolesRequest, BatchRemoveUserRolesResponse, CreateRoleRequest,
    PolicyRuleResponse, RemoveUserRoleRequest, RemoveUserRoleResponse, RoleListParams,
    RoleResponse, RoleSyncResponse, UpdateRoleRequest, UserRoleAssignmentResponse,
};
