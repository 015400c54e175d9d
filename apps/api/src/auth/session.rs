use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use tower_sessions::Session;
use vigil_core::{AppError, UserIdentity};

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let roles = state
        .role_assignment_service
        .list_user_roles(identity.user_id())
        .await?
        .into_iter()
        .map(|assigned| assigned.role.code.to_string())
        .collect();

    Ok(Json(UserIdentityResponse::from_identity_with_roles(
        &identity, roles,
    )))
}
