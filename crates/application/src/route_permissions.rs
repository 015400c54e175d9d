mod table;

pub use table::{RoutePermissionRule, RoutePermissionTable};

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use http::{HeaderMap, Method};
use vigil_core::{AppError, AppResult, UserId};
use vigil_domain::{AuthzDomain, CheckRequest};

/// Query parameter naming the target workspace.
pub const WORKSPACE_QUERY_PARAM: &str = "workspace_id";
/// Header naming the target workspace.
pub const WORKSPACE_HEADER: &str = "x-workspace-id";
/// Query parameter naming the target space.
pub const SPACE_QUERY_PARAM: &str = "space_id";
/// Header naming the target space.
pub const SPACE_HEADER: &str = "x-space-id";

/// Request shape inspected by the translator.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Request path without query string.
    pub path: &'a str,
    /// Raw query string, when present.
    pub query: Option<&'a str>,
    /// Request headers.
    pub headers: &'a HeaderMap,
}

/// Outcome of translating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The path is on the skip list.
    Skipped,
    /// No rule covers the route.
    Unmatched,
    /// A rule matched but no user is attached; authentication decides.
    Unauthenticated,
    /// The request must pass this check.
    Check(CheckRequest),
}

/// Treatment of requests no rule covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedRoutePolicy {
    /// Pass the request through unchecked.
    #[default]
    Allow,
    /// Reject the request.
    Deny,
}

impl UnmatchedRoutePolicy {
    /// Returns the stable configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl Display for UnmatchedRoutePolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for UnmatchedRoutePolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unmatched route policy must be 'allow' or 'deny', got '{value}'"
            ))),
        }
    }
}

impl RoutePermissionTable {
    /// Translates a request into the permission check guarding it.
    ///
    /// Fails with a validation error when a domain hint is malformed.
    pub fn translate(
        &self,
        request: &RouteRequest<'_>,
        user_id: Option<UserId>,
    ) -> AppResult<RouteDecision> {
        if self.is_skipped(request.path) {
            return Ok(RouteDecision::Skipped);
        }

        let Some((rule, action, resource_id)) = self.find_rule(request.method, request.path)
        else {
            return Ok(RouteDecision::Unmatched);
        };

        let Some(user_id) = user_id else {
            return Ok(RouteDecision::Unauthenticated);
        };

        let domain = resolve_domain(request.query, request.headers)?;

        Ok(RouteDecision::Check(
            CheckRequest::new(user_id, rule.resource(), action, &domain)
                .with_resource_id(resource_id),
        ))
    }
}

/// Resolves the request domain from query parameters and headers.
///
/// Precedence: `workspace_id` query, `X-Workspace-ID` header, `space_id`
/// query, `X-Space-ID` header, then global. Blank values are ignored.
pub fn resolve_domain(query: Option<&str>, headers: &HeaderMap) -> AppResult<AuthzDomain> {
    let query_value = |name: &str| {
        query.and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, value)| key == name && !value.trim().is_empty())
                .map(|(_, value)| value.trim().to_owned())
        })
    };
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    if let Some(id) = query_value(WORKSPACE_QUERY_PARAM).or_else(|| header_value(WORKSPACE_HEADER))
    {
        return AuthzDomain::workspace(id.as_str());
    }

    if let Some(id) = query_value(SPACE_QUERY_PARAM).or_else(|| header_value(SPACE_HEADER)) {
        return AuthzDomain::space(id.as_str());
    }

    Ok(AuthzDomain::Global)
}

#[cfg(test)]
mod tests;
