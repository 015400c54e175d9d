use serde::{Deserialize, Serialize};
use vigil_core::{AppError, AppResult};

/// Editable, nested permission definition attached to a role.
///
/// The tree is the administrator-facing source of truth; it is never read by
/// the enforcement path, which only sees rules compiled from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTree(Vec<DomainPermissions>);

/// Resources granted inside one domain kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPermissions {
    /// Domain kind or concrete domain (`global`, `workspace`, `space:3`).
    pub domain: String,
    /// Resources in the domain.
    pub resources: Vec<ResourcePermissions>,
}

/// Actions available on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermissions {
    /// Resource type identifier.
    pub resource: String,
    /// Display label.
    #[serde(default)]
    pub resource_name: String,
    /// Action leaves.
    pub actions: Vec<ActionPermission>,
}

/// One action leaf of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPermission {
    /// Action identifier.
    pub action: String,
    /// Display label.
    #[serde(default)]
    pub action_name: String,
    /// `1` when the action is currently granted.
    pub is_default: u8,
    /// Display ordering hint.
    #[serde(default)]
    pub sort_order: i32,
    /// `1` when the leaf is offered in the editor.
    #[serde(default = "active_flag")]
    pub is_active: u8,
}

/// Flattened view of one tree leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionLeaf<'a> {
    /// Domain of the leaf.
    pub domain: &'a str,
    /// Resource of the leaf.
    pub resource: &'a str,
    /// Action of the leaf.
    pub action: &'a str,
    /// Whether the leaf is granted.
    pub granted: bool,
}

fn active_flag() -> u8 {
    1
}

impl ActionPermission {
    /// Returns whether this leaf is granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.is_default == 1
    }
}

impl PermissionTree {
    /// Creates a tree from domain groups, validating every leaf.
    pub fn new(domains: Vec<DomainPermissions>) -> AppResult<Self> {
        let tree = Self(domains);
        tree.validate()?;
        Ok(tree)
    }

    /// Creates a tree without any domains.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parses the stored JSON representation.
    ///
    /// Blank input and `null` are treated as an absent tree.
    pub fn from_json(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::empty());
        }

        let tree = serde_json::from_str::<Self>(trimmed).map_err(|error| {
            AppError::Validation(format!("malformed permission tree: {error}"))
        })?;
        tree.validate()?;
        Ok(tree)
    }

    /// Converts an already decoded JSON value into a tree.
    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        if value.is_null() {
            return Ok(Self::empty());
        }

        let tree = serde_json::from_value::<Self>(value).map_err(|error| {
            AppError::Validation(format!("malformed permission tree: {error}"))
        })?;
        tree.validate()?;
        Ok(tree)
    }

    /// Serializes the tree to its stored JSON representation.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self).map_err(|error| {
            AppError::Internal(format!("failed to encode permission tree: {error}"))
        })
    }

    /// Returns the domain groups.
    #[must_use]
    pub fn domains(&self) -> &[DomainPermissions] {
        self.0.as_slice()
    }

    /// Returns true when the tree holds no domains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates every action leaf in document order.
    pub fn leaves(&self) -> impl Iterator<Item = PermissionLeaf<'_>> {
        self.0.iter().flat_map(|domain| {
            domain.resources.iter().flat_map(move |resource| {
                resource.actions.iter().map(move |action| PermissionLeaf {
                    domain: domain.domain.as_str(),
                    resource: resource.resource.as_str(),
                    action: action.action.as_str(),
                    granted: action.is_granted(),
                })
            })
        })
    }

    /// Iterates the granted leaves only.
    pub fn granted_leaves(&self) -> impl Iterator<Item = PermissionLeaf<'_>> {
        self.leaves().filter(|leaf| leaf.granted)
    }

    fn validate(&self) -> AppResult<()> {
        for domain in &self.0 {
            require_identifier("domain", domain.domain.as_str())?;
            for resource in &domain.resources {
                require_identifier("resource", resource.resource.as_str())?;
                for action in &resource.actions {
                    require_identifier("action", action.action.as_str())?;
                    require_flag(
                        "is_default",
                        action.is_default,
                        resource.resource.as_str(),
                        action.action.as_str(),
                    )?;
                    require_flag(
                        "is_active",
                        action.is_active,
                        resource.resource.as_str(),
                        action.action.as_str(),
                    )?;
                }
            }
        }

        Ok(())
    }
}

fn require_identifier(label: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "permission tree {label} must not be empty"
        )));
    }

    if value.trim() != value || value.contains(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "permission tree {label} '{value}' must not contain whitespace"
        )));
    }

    Ok(())
}

fn require_flag(label: &str, value: u8, resource: &str, action: &str) -> AppResult<()> {
    if value > 1 {
        return Err(AppError::Validation(format!(
            "permission tree {label} for '{resource}.{action}' must be 0 or 1, got {value}"
        )));
    }

    Ok(())
}
