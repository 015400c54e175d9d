use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Extension, Router};
use tower::ServiceExt;
use vigil_application::UnmatchedRoutePolicy;

use super::enforce_route_permissions;
use crate::state::AppState;
use crate::test_support::{
    ROLE_LIST_TREE, grant_role, grant_super_admin, identity, in_memory_state,
};

async fn ok_handler() -> &'static str {
    "ok"
}

fn app(state: AppState, user_id: Option<i64>) -> Router {
    let router = Router::new()
        .route("/api/roles", get(ok_handler).post(ok_handler))
        .route("/api/roles/{role_id}", get(ok_handler).delete(ok_handler))
        .route("/api/reports", get(ok_handler))
        .route_layer(from_fn_with_state(state.clone(), enforce_route_permissions))
        .with_state(state);

    match user_id {
        Some(user_id) => router.layer(Extension(identity(user_id))),
        None => router,
    }
}

async fn status(router: Router, method: &str, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    router
        .oneshot(request)
        .await
        .map(|response| response.status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[tokio::test]
async fn granted_action_passes_and_ungranted_action_is_forbidden() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);
    grant_role(&state, 5, "role_reader", ROLE_LIST_TREE).await;

    assert_eq!(
        status(app(state.clone(), Some(5)), "GET", "/api/roles").await,
        StatusCode::OK
    );
    assert_eq!(
        status(app(state, Some(5)), "POST", "/api/roles").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn user_without_roles_is_denied_by_default() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);

    assert_eq!(
        status(app(state, Some(8)), "GET", "/api/roles").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn super_admin_passes_every_rule() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);
    grant_super_admin(&state, 2).await;

    assert_eq!(
        status(app(state, Some(2)), "DELETE", "/api/roles/42").await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);

    assert_eq!(
        status(app(state, None), "GET", "/api/roles").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn unmatched_routes_follow_configured_policy() {
    let allowing = in_memory_state(UnmatchedRoutePolicy::Allow);
    assert_eq!(
        status(app(allowing, Some(5)), "GET", "/api/reports").await,
        StatusCode::OK
    );

    let denying = in_memory_state(UnmatchedRoutePolicy::Deny);
    assert_eq!(
        status(app(denying, Some(5)), "GET", "/api/reports").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn malformed_domain_hint_is_a_bad_request() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);
    grant_role(&state, 5, "role_reader", ROLE_LIST_TREE).await;

    assert_eq!(
        status(app(state, Some(5)), "GET", "/api/roles?workspace_id=a%3Ab").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn global_grant_does_not_cover_workspace_requests() {
    let state = in_memory_state(UnmatchedRoutePolicy::Allow);
    grant_role(&state, 5, "role_reader", ROLE_LIST_TREE).await;

    assert_eq!(
        status(app(state, Some(5)), "GET", "/api/roles?workspace_id=4").await,
        StatusCode::FORBIDDEN
    );
}
