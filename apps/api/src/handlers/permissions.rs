use axum::Json;
use axum::extract::{Query, State};
use vigil_core::{AppError, AppResult};
use vigil_domain::{CheckRequest, CheckResult, PermissionTree};

use crate::dto::{
    BatchCheckPermissionRequest, BatchCheckPermissionResponse, CheckPermissionRequest,
    CheckPermissionResponse, PermissionTemplateCatalogResponse, PermissionTemplateQuery,
    PermissionTemplateResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn tree_value(tree: &PermissionTree) -> AppResult<serde_json::Value> {
    serde_json::to_value(tree).map_err(|error| {
        AppError::Internal(format!("failed to serialize permission tree: {error}"))
    })
}

pub async fn permission_templates_handler(
    State(state): State<AppState>,
    Query(query): Query<PermissionTemplateQuery>,
) -> ApiResult<Json<PermissionTemplateCatalogResponse>> {
    let domain = query.domain.as_deref();
    let templates = state
        .permission_template_service
        .list_templates(domain)
        .await?
        .into_iter()
        .map(PermissionTemplateResponse::from)
        .collect();
    let tree = state
        .permission_template_service
        .permission_tree(domain)
        .await?;
    let default_tree = state
        .permission_template_service
        .default_tree(domain)
        .await?;

    Ok(Json(PermissionTemplateCatalogResponse {
        templates,
        tree: tree_value(&tree)?,
        default_tree: tree_value(&default_tree)?,
    }))
}

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let request = CheckRequest::try_from(payload)?;
    let result = state.enforcement_engine.check(&request).await?;

    Ok(Json(CheckPermissionResponse::from(result)))
}

/// Malformed items are reported in place; the rest of the batch is evaluated.
pub async fn batch_check_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<BatchCheckPermissionRequest>,
) -> ApiResult<Json<BatchCheckPermissionResponse>> {
    let items = payload
        .checks
        .into_iter()
        .map(|item| CheckRequest::try_from(item).map_err(rejected_item))
        .collect::<Vec<_>>();
    let requests = items
        .iter()
        .filter_map(|item| item.as_ref().ok())
        .cloned()
        .collect::<Vec<_>>();
    let mut evaluated = state
        .enforcement_engine
        .batch_check(&requests)
        .await
        .into_iter();

    let results = items
        .into_iter()
        .map(|item| match item {
            Ok(_) => evaluated
                .next()
                .unwrap_or_else(|| CheckResult::internal_error("batch item was not evaluated")),
            Err(rejected) => rejected,
        })
        .map(CheckPermissionResponse::from)
        .collect();

    Ok(Json(BatchCheckPermissionResponse { results }))
}

fn rejected_item(error: AppError) -> CheckResult {
    match error {
        AppError::Validation(message) => CheckResult::invalid_request(message),
        other => CheckResult::internal_error(other),
    }
}
