mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use vigil_core::AppError;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes =
        authorized_routes(app_state.clone()).route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}

/// Routes guarded by the route permission table.
///
/// Expects an authenticated `UserIdentity` extension on every request.
pub fn authorized_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/sync",
            post(handlers::roles::sync_role_handler),
        )
        .route(
            "/api/roles/{role_id}/policies",
            get(handlers::roles::role_policies_handler),
        )
        .route(
            "/api/roles/{role_id}/members",
            get(handlers::roles::role_members_handler),
        )
        .route(
            "/api/user-roles",
            post(handlers::user_roles::assign_user_role_handler),
        )
        .route(
            "/api/user-roles/batch",
            post(handlers::user_roles::batch_assign_user_roles_handler),
        )
        .route(
            "/api/user-roles/remove",
            post(handlers::user_roles::remove_user_role_handler),
        )
        .route(
            "/api/user-roles/batch-remove",
            post(handlers::user_roles::batch_remove_user_roles_handler),
        )
        .route(
            "/api/users/{user_id}/roles",
            get(handlers::user_roles::list_user_roles_handler),
        )
        .route(
            "/api/permission-templates",
            get(handlers::permissions::permission_templates_handler),
        )
        .route(
            "/api/permissions/check",
            post(handlers::permissions::check_permission_handler),
        )
        .route(
            "/api/permissions/batch-check",
            post(handlers::permissions::batch_check_permission_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::enforce_route_permissions,
        ))
}

#[cfg(test)]
mod tests;
