use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::AppError;

/// Scoping namespace a permission is evaluated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthzDomain {
    /// Platform-wide scope.
    Global,
    /// One workspace, addressed as `workspace:<id>`.
    Workspace(String),
    /// One space, addressed as `space:<id>`.
    Space(String),
}

impl AuthzDomain {
    /// Storage value of the global domain.
    pub const GLOBAL: &'static str = "global";
    /// Domain kind of workspace-scoped rules.
    pub const WORKSPACE_KIND: &'static str = "workspace";
    /// Domain kind of space-scoped rules.
    pub const SPACE_KIND: &'static str = "space";

    /// Creates a workspace domain from a workspace identifier.
    pub fn workspace(id: &str) -> Result<Self, AppError> {
        Ok(Self::Workspace(validated_scope_id(Self::WORKSPACE_KIND, id)?))
    }

    /// Creates a space domain from a space identifier.
    pub fn space(id: &str) -> Result<Self, AppError> {
        Ok(Self::Space(validated_scope_id(Self::SPACE_KIND, id)?))
    }

    /// Parses a request domain. An empty value resolves to the global domain.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        if value.is_empty() || value == Self::GLOBAL {
            return Ok(Self::Global);
        }

        match value.split_once(':') {
            Some((Self::WORKSPACE_KIND, id)) => Self::workspace(id),
            Some((Self::SPACE_KIND, id)) => Self::space(id),
            _ => Err(AppError::Validation(format!(
                "unknown authorization domain '{value}', expected 'global', 'workspace:<id>' or 'space:<id>'"
            ))),
        }
    }

    /// Returns the domain kind used by role permission trees.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Global => Self::GLOBAL,
            Self::Workspace(_) => Self::WORKSPACE_KIND,
            Self::Space(_) => Self::SPACE_KIND,
        }
    }

    /// Returns the namespaced storage value.
    #[must_use]
    pub fn as_storage_value(&self) -> String {
        match self {
            Self::Global => Self::GLOBAL.to_owned(),
            Self::Workspace(id) => format!("{}:{id}", Self::WORKSPACE_KIND),
            Self::Space(id) => format!("{}:{id}", Self::SPACE_KIND),
        }
    }

    /// Returns the policy domains a request in this domain is matched against.
    ///
    /// A policy written for the concrete domain or for its kind applies, so a
    /// role granting `workspace` permissions is effective in every workspace.
    #[must_use]
    pub fn policy_domains(&self) -> Vec<String> {
        match self {
            Self::Global => vec![Self::GLOBAL.to_owned()],
            _ => vec![self.as_storage_value(), self.kind().to_owned()],
        }
    }
}

impl Display for AuthzDomain {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_storage_value().as_str())
    }
}

impl FromStr for AuthzDomain {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for AuthzDomain {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<AuthzDomain> for String {
    fn from(value: AuthzDomain) -> Self {
        value.as_storage_value()
    }
}

fn validated_scope_id(kind: &str, id: &str) -> Result<String, AppError> {
    let id = id.trim();
    if id.is_empty() || id.contains(':') {
        return Err(AppError::Validation(format!(
            "{kind} domain id '{id}' must be non-empty and must not contain ':'"
        )));
    }

    Ok(id.to_owned())
}
