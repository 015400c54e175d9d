use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use tracing::{info, warn};
use vigil_application::{RouteDecision, RouteRequest, UnmatchedRoutePolicy};
use vigil_core::{AppError, UserIdentity};

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Guards routes with the permission check their rule resolves to.
///
/// Runs after `require_auth`, reading the identity it attached.
pub async fn enforce_route_permissions(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user_id = request
        .extensions()
        .get::<UserIdentity>()
        .map(UserIdentity::user_id);
    let decision = state.route_permissions.translate(
        &RouteRequest {
            method: request.method(),
            path: request.uri().path(),
            query: request.uri().query(),
            headers: request.headers(),
        },
        user_id,
    )?;

    match decision {
        RouteDecision::Skipped => {}
        RouteDecision::Unmatched => {
            let method = request.method();
            let path = request.uri().path();
            warn!(
                %method,
                path,
                policy = %state.unmatched_route_policy,
                "no permission rule covers route"
            );
            if state.unmatched_route_policy == UnmatchedRoutePolicy::Deny {
                return Err(AppError::Forbidden(format!(
                    "no permission rule covers {method} {path}"
                ))
                .into());
            }
        }
        RouteDecision::Unauthenticated => {
            return Err(AppError::Unauthorized("authentication required".to_owned()).into());
        }
        RouteDecision::Check(check) => {
            let result = state.enforcement_engine.check(&check).await?;
            if !result.allowed {
                info!(
                    user_id = %check.user_id,
                    resource = %check.resource,
                    resource_id = %check.resource_id,
                    action = %check.action,
                    domain = %check.domain,
                    reason = %result.reason,
                    "request denied"
                );
                return Err(AppError::Forbidden(result.reason).into());
            }
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests;
