use axum::body::{Body, to_bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use serde_json::{Value, json};
use tower::ServiceExt;
use vigil_application::UnmatchedRoutePolicy;

use super::authorized_routes;
use crate::state::AppState;
use crate::test_support::{grant_super_admin, identity, in_memory_state};

const ADMIN: i64 = 2;

const WORKFLOW_CREATE_TREE: &str = r#"[{"domain":"workspace","resources":[{"resource":"workflow","actions":[{"action":"list","is_default":0},{"action":"create","is_default":1}]}]}]"#;

async fn admin_state() -> AppState {
    let state = in_memory_state(UnmatchedRoutePolicy::Deny);
    grant_super_admin(&state, ADMIN).await;
    state
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let router: Router = authorized_routes(state.clone())
        .layer(Extension(identity(ADMIN)))
        .with_state(state.clone());

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |value| Body::from(value.to_string())))
        .unwrap_or_default();

    let Ok(response) = router.oneshot(request).await else {
        panic!("router failed to respond to {method} {uri}");
    };
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, payload)
}

async fn create_workflow_editor(state: &AppState) -> i64 {
    let tree: Value = serde_json::from_str(WORKFLOW_CREATE_TREE).unwrap_or(Value::Null);
    let (status, role) = send(
        state,
        "POST",
        "/api/roles",
        Some(json!({
            "code": "workflow_editor",
            "name": "Workflow Editor",
            "permissions": tree,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected payload: {role}");

    role["id"].as_i64().unwrap_or_default()
}

#[tokio::test]
async fn assigned_role_grants_exactly_its_compiled_actions() {
    let state = admin_state().await;
    let role_id = create_workflow_editor(&state).await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/user-roles",
        Some(json!({ "user_id": 7, "role_id": role_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, granted) = send(
        &state,
        "POST",
        "/api/permissions/check",
        Some(json!({
            "user_id": 7,
            "resource": "workflow",
            "action": "create",
            "domain": "workspace:3",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(granted["allowed"], json!(true));

    let (_, ungranted) = send(
        &state,
        "POST",
        "/api/permissions/check",
        Some(json!({
            "user_id": 7,
            "resource": "workflow",
            "action": "list",
            "domain": "workspace:3",
        })),
    )
    .await;
    assert_eq!(ungranted["allowed"], json!(false));
}

#[tokio::test]
async fn removing_the_assignment_revokes_access() {
    let state = admin_state().await;
    let role_id = create_workflow_editor(&state).await;
    let assignment = json!({ "user_id": 7, "role_id": role_id });

    let (status, _) = send(&state, "POST", "/api/user-roles", Some(assignment.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, removed) =
        send(&state, "POST", "/api/user-roles/remove", Some(assignment)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["removed"], json!(true));

    let (_, result) = send(
        &state,
        "POST",
        "/api/permissions/check",
        Some(json!({
            "user_id": 7,
            "resource": "workflow",
            "action": "create",
            "domain": "workspace:3",
        })),
    )
    .await;
    assert_eq!(result["allowed"], json!(false));
}

#[tokio::test]
async fn roles_created_without_permissions_receive_default_actions() {
    let state = admin_state().await;

    let (status, role) = send(
        &state,
        "POST",
        "/api/roles",
        Some(json!({ "code": "observer", "name": "Observer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let role_id = role["id"].as_i64().unwrap_or_default();
    let (status, policies) = send(
        &state,
        "GET",
        &format!("/api/roles/{role_id}/policies"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let policies = policies.as_array().cloned().unwrap_or_default();
    assert!(!policies.is_empty());
    assert!(
        policies
            .iter()
            .all(|rule| rule["action"] == json!("list") && rule["subject"] == json!("observer"))
    );
}

#[tokio::test]
async fn duplicate_codes_and_builtin_roles_are_conflicts() {
    let state = admin_state().await;
    create_workflow_editor(&state).await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/roles",
        Some(json!({ "code": "workflow_editor", "name": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, roles) = send(&state, "GET", "/api/roles?keyword=super", None).await;
    let builtin_id = roles[0]["id"].as_i64().unwrap_or_default();
    let (status, _) = send(
        &state,
        "DELETE",
        &format!("/api/roles/{builtin_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn batch_check_reports_items_in_order() {
    let state = admin_state().await;

    let (status, payload) = send(
        &state,
        "POST",
        "/api/permissions/batch-check",
        Some(json!({
            "checks": [
                { "user_id": ADMIN, "resource": "role", "action": "delete" },
                { "user_id": 9, "resource": "role", "action": "delete" },
                { "user_id": 9, "resource": "role", "action": "delete", "domain": "tenant:1" },
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = payload["results"].as_array().cloned().unwrap_or_default();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["allowed"], json!(true));
    assert_eq!(results[1]["allowed"], json!(false));
    assert!(
        results[2]["reason"]
            .as_str()
            .is_some_and(|reason| reason.starts_with("invalid request"))
    );
}

#[tokio::test]
async fn batch_check_reports_malformed_user_ids_in_place() {
    let state = admin_state().await;

    let (status, payload) = send(
        &state,
        "POST",
        "/api/permissions/batch-check",
        Some(json!({
            "checks": [
                { "user_id": 0, "resource": "role", "action": "list" },
                { "user_id": ADMIN, "resource": "role", "action": "list" },
                { "user_id": -4, "resource": "role", "action": "list" },
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = payload["results"].as_array().cloned().unwrap_or_default();
    assert_eq!(results.len(), 3);
    for rejected in [&results[0], &results[2]] {
        assert_eq!(rejected["allowed"], json!(false));
        assert!(
            rejected["reason"]
                .as_str()
                .is_some_and(|reason| reason.starts_with("invalid request"))
        );
    }
    assert_eq!(results[1]["allowed"], json!(true));
}

#[tokio::test]
async fn permission_catalog_lists_templates_with_trees() {
    let state = admin_state().await;

    let (status, catalog) = send(
        &state,
        "GET",
        "/api/permission-templates?domain=workspace",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let templates = catalog["templates"].as_array().cloned().unwrap_or_default();
    assert_eq!(templates.len(), 2);
    assert!(templates.iter().all(|entry| entry["domain"] == json!("workspace")));

    let actions = |tree: &str| -> Vec<(String, u64)> {
        catalog[tree][0]["resources"][0]["actions"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|action| {
                (
                    action["action"].as_str().unwrap_or_default().to_owned(),
                    action["is_default"].as_u64().unwrap_or_default(),
                )
            })
            .collect()
    };
    assert_eq!(
        actions("tree"),
        vec![("list".to_owned(), 1), ("create".to_owned(), 0)]
    );
    assert_eq!(actions("default_tree"), vec![("list".to_owned(), 1)]);
}
