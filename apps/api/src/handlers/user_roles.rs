use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use vigil_core::{AppError, AppResult, UserId, UserIdentity};

use crate::dto::{
    AssignUserRoleRequest, AssignedRoleResponse, BatchAssignUserRolesRequest,
    BatchRemoveUserRolesRequest, BatchRemoveUserRolesResponse, RemoveUserRoleRequest,
    RemoveUserRoleResponse, UserRoleAssignmentResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_expiry(value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|error| {
                    AppError::Validation(format!("invalid expired_at '{raw}': {error}"))
                })
        })
        .transpose()
}

fn parse_user_ids(values: &[i64]) -> AppResult<Vec<UserId>> {
    values.iter().copied().map(UserId::new).collect()
}

pub async fn assign_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<AssignUserRoleRequest>,
) -> ApiResult<(StatusCode, Json<UserRoleAssignmentResponse>)> {
    let assignment = state
        .role_assignment_service
        .assign_user_to_role(
            &user,
            UserId::new(payload.user_id)?,
            payload.role_id,
            parse_expiry(payload.expired_at.as_deref())?,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserRoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn remove_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RemoveUserRoleRequest>,
) -> ApiResult<Json<RemoveUserRoleResponse>> {
    let removed = state
        .role_assignment_service
        .remove_user_from_role(&user, UserId::new(payload.user_id)?, payload.role_id)
        .await?;

    Ok(Json(RemoveUserRoleResponse { removed }))
}

pub async fn batch_assign_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<BatchAssignUserRolesRequest>,
) -> ApiResult<(StatusCode, Json<Vec<UserRoleAssignmentResponse>>)> {
    let assignments = state
        .role_assignment_service
        .batch_assign_users_to_role(
            &user,
            &parse_user_ids(&payload.user_ids)?,
            payload.role_id,
            parse_expiry(payload.expired_at.as_deref())?,
        )
        .await?
        .into_iter()
        .map(UserRoleAssignmentResponse::from)
        .collect();

    Ok((StatusCode::CREATED, Json(assignments)))
}

pub async fn batch_remove_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<BatchRemoveUserRolesRequest>,
) -> ApiResult<Json<BatchRemoveUserRolesResponse>> {
    let removed = state
        .role_assignment_service
        .batch_remove_users_from_role(&user, &parse_user_ids(&payload.user_ids)?, payload.role_id)
        .await?;

    Ok(Json(BatchRemoveUserRolesResponse { removed }))
}

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<AssignedRoleResponse>>> {
    let roles = state
        .role_assignment_service
        .list_user_roles(UserId::new(user_id)?)
        .await?
        .into_iter()
        .map(AssignedRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

#[cfg(test)]
mod tests {
    use super::parse_expiry;

    #[test]
    fn expiry_accepts_offsets_and_rejects_garbage() {
        let parsed = parse_expiry(Some("2030-01-01T02:00:00+02:00")).unwrap_or_default();
        assert_eq!(
            parsed.map(|value| value.to_rfc3339()),
            Some("2030-01-01T00:00:00+00:00".to_owned())
        );

        assert!(matches!(parse_expiry(None), Ok(None)));
        assert!(parse_expiry(Some("tomorrow")).is_err());
    }
}
