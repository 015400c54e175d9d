use std::str::FromStr;

use http::{HeaderMap, HeaderValue, Method};
use vigil_domain::AuthzDomain;

use crate::test_support::user;

use super::{
    RouteDecision, RoutePermissionRule, RoutePermissionTable, RouteRequest, UnmatchedRoutePolicy,
    resolve_domain,
};

fn table() -> RoutePermissionTable {
    let workflows = RoutePermissionRule::new(r"/api/workflows", "workflow")
        .map(|rule| {
            rule.action(Method::GET, "list")
                .action(Method::POST, "create")
        })
        .unwrap_or_else(|_| unreachable!());
    let workflow = RoutePermissionRule::new(r"/api/workflows/(\d+)", "workflow")
        .map(|rule| {
            rule.action(Method::GET, "read")
                .action(Method::DELETE, "delete")
                .with_resource_id()
        })
        .unwrap_or_else(|_| unreachable!());
    let workflow_publish = RoutePermissionRule::new(r"/api/workflows/(\d+)", "workflow_release")
        .map(|rule| rule.action(Method::PUT, "publish"))
        .unwrap_or_else(|_| unreachable!());

    RoutePermissionTable::new()
        .skip("/health")
        .rule(workflows)
        .rule(workflow)
        .rule(workflow_publish)
}

fn translate(
    method: Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
) -> RouteDecision {
    table()
        .translate(
            &RouteRequest {
                method: &method,
                path,
                query,
                headers,
            },
            Some(user(5)),
        )
        .unwrap_or(RouteDecision::Skipped)
}

#[test]
fn skip_list_bypasses_checks() {
    let decision = translate(Method::GET, "/health", None, &HeaderMap::new());
    assert_eq!(decision, RouteDecision::Skipped);
}

#[test]
fn captured_id_becomes_resource_id() {
    let decision = translate(
        Method::DELETE,
        "/api/workflows/88",
        Some("workspace_id=9"),
        &HeaderMap::new(),
    );

    assert!(matches!(
        decision,
        RouteDecision::Check(request)
            if request.resource == "workflow"
                && request.resource_id == "88"
                && request.action == "delete"
                && request.domain == "workspace:9"
    ));
}

#[test]
fn collection_route_uses_wildcard_id() {
    let decision = translate(Method::POST, "/api/workflows", None, &HeaderMap::new());

    assert!(matches!(
        decision,
        RouteDecision::Check(request)
            if request.resource_id == "*"
                && request.action == "create"
                && request.domain == "global"
    ));
}

#[test]
fn rule_without_method_falls_through_to_later_rule() {
    let decision = translate(Method::PUT, "/api/workflows/88", None, &HeaderMap::new());

    assert!(matches!(
        decision,
        RouteDecision::Check(request)
            if request.resource == "workflow_release"
                && request.action == "publish"
                && request.resource_id == "*"
    ));
}

#[test]
fn unknown_method_or_path_is_unmatched() {
    assert_eq!(
        translate(Method::PATCH, "/api/workflows/88", None, &HeaderMap::new()),
        RouteDecision::Unmatched
    );
    assert_eq!(
        translate(Method::GET, "/api/workflows/88/steps", None, &HeaderMap::new()),
        RouteDecision::Unmatched
    );
}

#[test]
fn missing_user_passes_to_authentication() {
    let headers = HeaderMap::new();
    let decision = table().translate(
        &RouteRequest {
            method: &Method::GET,
            path: "/api/workflows",
            query: None,
            headers: &headers,
        },
        None,
    );

    assert!(matches!(decision, Ok(RouteDecision::Unauthenticated)));
}

#[test]
fn anonymous_request_with_malformed_domain_is_unauthenticated() {
    let mut headers = HeaderMap::new();
    headers.insert("x-workspace-id", HeaderValue::from_static("a:b"));
    let decision = table().translate(
        &RouteRequest {
            method: &Method::GET,
            path: "/api/workflows",
            query: None,
            headers: &headers,
        },
        None,
    );

    assert!(matches!(decision, Ok(RouteDecision::Unauthenticated)));
}

#[test]
fn domain_precedence_prefers_workspace_query() {
    let mut headers = HeaderMap::new();
    headers.insert("x-workspace-id", HeaderValue::from_static("2"));
    headers.insert("x-space-id", HeaderValue::from_static("3"));

    let from_query = resolve_domain(Some("space_id=4&workspace_id=1"), &headers);
    assert!(matches!(from_query, Ok(AuthzDomain::Workspace(id)) if id == "1"));

    let from_header = resolve_domain(Some("space_id=4"), &headers);
    assert!(matches!(from_header, Ok(AuthzDomain::Workspace(id)) if id == "2"));

    let mut space_headers = HeaderMap::new();
    space_headers.insert("x-space-id", HeaderValue::from_static("3"));
    let space_query = resolve_domain(Some("space_id=4"), &space_headers);
    assert!(matches!(space_query, Ok(AuthzDomain::Space(id)) if id == "4"));

    let space_header = resolve_domain(None, &space_headers);
    assert!(matches!(space_header, Ok(AuthzDomain::Space(id)) if id == "3"));
}

#[test]
fn blank_domain_sources_are_ignored() {
    let mut headers = HeaderMap::new();
    headers.insert("x-workspace-id", HeaderValue::from_static(" "));

    let domain = resolve_domain(Some("workspace_id=&space_id=7"), &headers);
    assert!(matches!(domain, Ok(AuthzDomain::Space(id)) if id == "7"));

    assert!(matches!(
        resolve_domain(None, &HeaderMap::new()),
        Ok(AuthzDomain::Global)
    ));
}

#[test]
fn malformed_domain_hint_is_rejected() {
    assert!(resolve_domain(Some("workspace_id=a%3Ab"), &HeaderMap::new()).is_err());
}

#[test]
fn invalid_pattern_is_rejected() {
    assert!(RoutePermissionRule::new(r"/api/(unclosed", "workflow").is_err());
    assert!(RoutePermissionRule::new(r"/api/workflows", " ").is_err());
}

#[test]
fn patterns_are_anchored() {
    assert_eq!(
        translate(Method::GET, "/v2/api/workflows", None, &HeaderMap::new()),
        RouteDecision::Unmatched
    );
}

#[test]
fn unmatched_policy_parses_config_values() {
    assert!(matches!(
        UnmatchedRoutePolicy::from_str(" Deny "),
        Ok(UnmatchedRoutePolicy::Deny)
    ));
    assert!(matches!(
        UnmatchedRoutePolicy::from_str("allow"),
        Ok(UnmatchedRoutePolicy::Allow)
    ));
    assert!(UnmatchedRoutePolicy::from_str("maybe").is_err());
}
