use serde::{Deserialize, Serialize};
use ts_rs::TS;
use vigil_application::PermissionTemplate;
use vigil_core::{AppError, UserId};
use vigil_domain::{CheckRequest, CheckResult, WILDCARD_RESOURCE_ID};

/// Query parameters for the permission catalog.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionTemplateQuery {
    pub domain: Option<String>,
}

/// API representation of one catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-template-response.ts"
)]
pub struct PermissionTemplateResponse {
    pub id: i64,
    pub template_code: String,
    pub domain: String,
    pub resource: String,
    pub resource_name: String,
    pub action: String,
    pub action_name: String,
    pub is_default: bool,
    pub sort_order: i32,
}

impl From<PermissionTemplate> for PermissionTemplateResponse {
    fn from(value: PermissionTemplate) -> Self {
        Self {
            id: value.id,
            template_code: value.template_code,
            domain: value.domain,
            resource: value.resource,
            resource_name: value.resource_name,
            action: value.action,
            action_name: value.action_name,
            is_default: value.is_default,
            sort_order: value.sort_order,
        }
    }
}

/// Catalog listing plus the trees the role editor starts from.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-template-catalog-response.ts"
)]
pub struct PermissionTemplateCatalogResponse {
    pub templates: Vec<PermissionTemplateResponse>,
    /// Every active catalog action, granted where its template is a default.
    #[ts(type = "unknown")]
    pub tree: serde_json::Value,
    /// Catalog actions granted to new roles by default.
    #[ts(type = "unknown")]
    pub default_tree: serde_json::Value,
}

/// Incoming payload for a single permission check.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/check-permission-request.ts"
)]
pub struct CheckPermissionRequest {
    pub user_id: i64,
    pub resource: String,
    pub resource_id: Option<String>,
    pub action: String,
    /// `global`, `workspace:<id>` or `space:<id>`; omitted means global.
    pub domain: Option<String>,
}

impl TryFrom<CheckPermissionRequest> for CheckRequest {
    type Error = AppError;

    fn try_from(value: CheckPermissionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(value.user_id)?,
            resource: value.resource,
            resource_id: value
                .resource_id
                .unwrap_or_else(|| WILDCARD_RESOURCE_ID.to_owned()),
            action: value.action,
            domain: value.domain.unwrap_or_default(),
        })
    }
}

/// Outcome of one permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/check-permission-response.ts"
)]
pub struct CheckPermissionResponse {
    pub allowed: bool,
    pub reason: String,
}

impl From<CheckResult> for CheckPermissionResponse {
    fn from(value: CheckResult) -> Self {
        Self {
            allowed: value.allowed,
            reason: value.reason,
        }
    }
}

/// Incoming payload for several independent checks.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-check-permission-request.ts"
)]
pub struct BatchCheckPermissionRequest {
    pub checks: Vec<CheckPermissionRequest>,
}

/// Outcomes in request order.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/batch-check-permission-response.ts"
)]
pub struct BatchCheckPermissionResponse {
    pub results: Vec<CheckPermissionResponse>,
}
