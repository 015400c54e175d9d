use serde::Serialize;

/// Catalog entry describing one grantable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionTemplate {
    /// Stable template identifier.
    pub id: i64,
    /// Unique template code, `<domain>.<resource>.<action>` by convention.
    pub template_code: String,
    /// Domain kind.
    pub domain: String,
    /// Resource identifier.
    pub resource: String,
    /// Resource display label.
    pub resource_name: String,
    /// Action identifier.
    pub action: String,
    /// Action display label.
    pub action_name: String,
    /// Whether new roles are granted this action by default.
    pub is_default: bool,
    /// Display ordering hint.
    pub sort_order: i32,
    /// Inactive templates are hidden and cannot be granted.
    pub is_active: bool,
}
