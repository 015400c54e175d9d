use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use vigil_application::{CreateRoleInput, RoleListQuery, UpdateRoleInput};
use vigil_core::{AppError, UserIdentity};
use vigil_domain::{PermissionTree, RoleDomain};

use crate::dto::{
    CreateRoleRequest, PolicyRuleResponse, RoleListParams, RoleResponse, RoleSyncResponse,
    UpdateRoleRequest, UserRoleAssignmentResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

const MAX_ROLE_PAGE_SIZE: usize = 500;

impl TryFrom<RoleListParams> for RoleListQuery {
    type Error = AppError;

    fn try_from(value: RoleListParams) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        Ok(Self {
            domain: value
                .domain
                .as_deref()
                .map(RoleDomain::from_str)
                .transpose()?,
            keyword: value.keyword,
            include_disabled: value.include_disabled.unwrap_or(defaults.include_disabled),
            limit: value
                .limit
                .unwrap_or(defaults.limit)
                .clamp(1, MAX_ROLE_PAGE_SIZE),
            offset: value.offset.unwrap_or(defaults.offset),
        })
    }
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Query(params): Query<RoleListParams>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles(&params.try_into()?)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let domain = payload
        .domain
        .as_deref()
        .map(RoleDomain::from_str)
        .transpose()?
        .unwrap_or(RoleDomain::Global);
    let permissions = match payload.permissions {
        Some(value) => PermissionTree::from_value(value)?,
        None => state.permission_template_service.default_tree(None).await?,
    };

    let role = state
        .role_service
        .create_role(
            &user,
            CreateRoleInput {
                code: payload.code,
                name: payload.name,
                domain,
                space_role_type: payload.space_role_type,
                permissions,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.role_service.get_role(role_id).await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .update_role(
            &user,
            role_id,
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                space_role_type: payload.space_role_type,
                is_disabled: payload.is_disabled,
                permissions: payload
                    .permissions
                    .map(PermissionTree::from_value)
                    .transpose()?,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.role_service.delete_role(&user, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sync_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<RoleSyncResponse>> {
    let rule_count = state.role_service.resync_role(&user, role_id).await?;
    Ok(Json(RoleSyncResponse {
        role_id,
        rule_count,
    }))
}

pub async fn role_policies_handler(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<Vec<PolicyRuleResponse>>> {
    let role = state.role_service.get_role(role_id).await?;
    let policies = state
        .policy_sync_service
        .policies_for(role.code.as_str())
        .await?
        .into_iter()
        .map(PolicyRuleResponse::from)
        .collect();

    Ok(Json(policies))
}

pub async fn role_members_handler(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<Vec<UserRoleAssignmentResponse>>> {
    let members = state
        .role_assignment_service
        .list_role_members(role_id)
        .await?
        .into_iter()
        .map(UserRoleAssignmentResponse::from)
        .collect();

    Ok(Json(members))
}
