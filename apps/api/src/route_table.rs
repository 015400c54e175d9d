use axum::http::Method;
use vigil_application::{RoutePermissionRule, RoutePermissionTable};
use vigil_core::AppResult;

/// Builds the permission table guarding the admin and check endpoints.
///
/// Rules are evaluated in order; the first rule whose pattern matches and
/// that maps the request method decides the check.
pub fn api_route_permissions() -> AppResult<RoutePermissionTable> {
    Ok(RoutePermissionTable::new()
        .skip("/health")
        .skip("/auth/me")
        .rule(
            RoutePermissionRule::new(r"/api/roles", "role")?
                .action(Method::GET, "list")
                .action(Method::POST, "create"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/roles/(\d+)/sync", "role")?
                .action(Method::POST, "sync"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/roles/(\d+)/policies", "role")?
                .action(Method::GET, "read")
                .with_resource_id(),
        )
        .rule(
            RoutePermissionRule::new(r"/api/roles/(\d+)/members", "user_role")?
                .action(Method::GET, "list"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/roles/(\d+)", "role")?
                .action(Method::GET, "read")
                .action(Method::PUT, "update")
                .action(Method::DELETE, "delete")
                .with_resource_id(),
        )
        .rule(
            RoutePermissionRule::new(r"/api/user-roles(/batch)?", "user_role")?
                .action(Method::POST, "assign"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/user-roles/(remove|batch-remove)", "user_role")?
                .action(Method::POST, "remove"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/users/(\d+)/roles", "user_role")?
                .action(Method::GET, "list"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/permission-templates", "permission_template")?
                .action(Method::GET, "list"),
        )
        .rule(
            RoutePermissionRule::new(r"/api/permissions/(check|batch-check)", "permission")?
                .action(Method::POST, "check"),
        ))
}
