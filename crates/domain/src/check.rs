use serde::{Deserialize, Serialize};
use vigil_core::{AppResult, UserId};

use crate::{AuthzDomain, Decision};

/// Resource id meaning "the resource type as a whole".
pub const WILDCARD_RESOURCE_ID: &str = "*";

/// One authorization question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Authenticated user.
    pub user_id: UserId,
    /// Resource type.
    pub resource: String,
    /// Concrete resource id, empty or `*` for the whole type.
    #[serde(default)]
    pub resource_id: String,
    /// Action identifier.
    pub action: String,
    /// `global`, `workspace:<id>` or `space:<id>`; empty means global.
    #[serde(default)]
    pub domain: String,
}

impl CheckRequest {
    /// Creates a request for the resource type as a whole.
    #[must_use]
    pub fn new(
        user_id: UserId,
        resource: impl Into<String>,
        action: impl Into<String>,
        domain: &AuthzDomain,
    ) -> Self {
        Self {
            user_id,
            resource: resource.into(),
            resource_id: WILDCARD_RESOURCE_ID.to_owned(),
            action: action.into(),
            domain: domain.as_storage_value(),
        }
    }

    /// Narrows the request to one resource instance.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    /// Parses the request domain.
    pub fn authz_domain(&self) -> AppResult<AuthzDomain> {
        AuthzDomain::parse(self.domain.as_str())
    }

    /// Returns the objects a rule may name to match this request, most
    /// specific first.
    #[must_use]
    pub fn objects(&self) -> Vec<String> {
        let resource_id = self.resource_id.trim();
        if resource_id.is_empty() || resource_id == WILDCARD_RESOURCE_ID {
            return vec![self.resource.clone()];
        }

        vec![
            format!("{}:{resource_id}", self.resource),
            self.resource.clone(),
        ]
    }
}

/// Answer to a [`CheckRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the action is permitted.
    pub allowed: bool,
    /// Short explanation of the outcome.
    pub reason: String,
}

impl CheckResult {
    /// Builds the result reported for an item that failed to evaluate.
    #[must_use]
    pub fn internal_error(message: impl std::fmt::Display) -> Self {
        Self {
            allowed: false,
            reason: format!("internal error: {message}"),
        }
    }

    /// Builds the result reported for an item that could not be evaluated
    /// because the request itself is malformed.
    #[must_use]
    pub fn invalid_request(message: impl std::fmt::Display) -> Self {
        Self {
            allowed: false,
            reason: format!("invalid request: {message}"),
        }
    }
}

impl From<Decision> for CheckResult {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.is_allowed(),
            reason: decision.reason().to_owned(),
        }
    }
}
