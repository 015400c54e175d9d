use std::collections::{BTreeSet, HashMap};

use http::Method;
use regex::Regex;
use vigil_core::{AppError, AppResult};
use vigil_domain::WILDCARD_RESOURCE_ID;

/// Maps one path pattern to the resource it guards.
#[derive(Debug, Clone)]
pub struct RoutePermissionRule {
    pattern: Regex,
    resource: String,
    action_by_method: HashMap<Method, String>,
    require_resource_id: bool,
}

impl RoutePermissionRule {
    /// Creates a rule from a path regex. The pattern is anchored at both ends.
    pub fn new(pattern: &str, resource: impl Into<String>) -> AppResult<Self> {
        let anchored = format!(
            "^{}$",
            pattern.trim_start_matches('^').trim_end_matches('$')
        );
        let pattern = Regex::new(anchored.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid route pattern '{pattern}': {error}"))
        })?;

        let resource = resource.into();
        if resource.trim().is_empty() {
            return Err(AppError::Validation(
                "route rule resource must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            pattern,
            resource,
            action_by_method: HashMap::new(),
            require_resource_id: false,
        })
    }

    /// Maps a method to the action it performs.
    #[must_use]
    pub fn action(mut self, method: Method, action: impl Into<String>) -> Self {
        self.action_by_method.insert(method, action.into());
        self
    }

    /// Uses the first capture group as the resource id.
    #[must_use]
    pub fn with_resource_id(mut self) -> Self {
        self.require_resource_id = true;
        self
    }

    /// Returns the guarded resource type.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the path regex.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the action a method maps to.
    #[must_use]
    pub fn action_for(&self, method: &Method) -> Option<&str> {
        self.action_by_method.get(method).map(String::as_str)
    }

    /// Returns the action and resource id when the rule covers the request.
    fn resolve(&self, method: &Method, path: &str) -> Option<(&str, String)> {
        let captures = self.pattern.captures(path)?;
        let action = self.action_for(method)?;

        let resource_id = self
            .require_resource_id
            .then(|| captures.get(1))
            .flatten()
            .map(|capture| capture.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or(WILDCARD_RESOURCE_ID)
            .to_owned();

        Some((action, resource_id))
    }
}

/// Ordered route rules plus paths exempt from checks.
#[derive(Debug, Clone, Default)]
pub struct RoutePermissionTable {
    skip_paths: BTreeSet<String>,
    rules: Vec<RoutePermissionRule>,
}

impl RoutePermissionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exempts an exact path from permission checks.
    #[must_use]
    pub fn skip(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.insert(path.into());
        self
    }

    /// Appends a rule; earlier rules win.
    #[must_use]
    pub fn rule(mut self, rule: RoutePermissionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RoutePermissionRule] {
        self.rules.as_slice()
    }

    pub(super) fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.contains(path)
    }

    /// Finds the first rule whose pattern matches and that maps the method.
    pub(super) fn find_rule(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&RoutePermissionRule, &str, String)> {
        self.rules.iter().find_map(|rule| {
            rule.resolve(method, path)
                .map(|(action, resource_id)| (rule, action, resource_id))
        })
    }
}
