use std::collections::BTreeSet;
use std::sync::Arc;

use vigil_core::{AppError, AppResult};
use vigil_domain::{ActionPermission, DomainPermissions, PermissionTree, ResourcePermissions};

use crate::authz_ports::{PermissionTemplate, PermissionTemplateRepository};

/// Application service exposing the permission template catalog.
#[derive(Clone)]
pub struct PermissionTemplateService {
    repository: Arc<dyn PermissionTemplateRepository>,
}

impl PermissionTemplateService {
    /// Creates a new template service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionTemplateRepository>) -> Self {
        Self { repository }
    }

    /// Lists active templates ordered by `(sort_order, id)`.
    pub async fn list_templates(&self, domain: Option<&str>) -> AppResult<Vec<PermissionTemplate>> {
        let mut templates = self
            .repository
            .list_templates(domain)
            .await?
            .into_iter()
            .filter(|template| template.is_active)
            .collect::<Vec<_>>();
        templates.sort_by_key(|template| (template.sort_order, template.id));
        Ok(templates)
    }

    /// Returns the editor tree with every active action, each marked granted
    /// according to its template default.
    pub async fn permission_tree(&self, domain: Option<&str>) -> AppResult<PermissionTree> {
        let templates = self.list_templates(domain).await?;
        build_tree(templates.iter())
    }

    /// Returns the tree granted to new roles: default actions only.
    pub async fn default_tree(&self, domain: Option<&str>) -> AppResult<PermissionTree> {
        let templates = self.list_templates(domain).await?;
        build_tree(templates.iter().filter(|template| template.is_default))
    }

    /// Ensures every granted leaf of a tree names an active template.
    pub async fn validate_tree(&self, tree: &PermissionTree) -> AppResult<()> {
        let known = self
            .list_templates(None)
            .await?
            .into_iter()
            .map(|template| (template.domain, template.resource, template.action))
            .collect::<BTreeSet<_>>();

        let unknown = tree
            .granted_leaves()
            .filter(|leaf| {
                !known.contains(&(
                    leaf.domain.to_owned(),
                    leaf.resource.to_owned(),
                    leaf.action.to_owned(),
                ))
            })
            .map(|leaf| format!("{}.{}.{}", leaf.domain, leaf.resource, leaf.action))
            .collect::<Vec<_>>();

        if unknown.is_empty() {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "permission tree grants unknown or inactive permissions: {}",
            unknown.join(", ")
        )))
    }
}

/// Groups templates by domain then resource, keeping first-seen order.
fn build_tree<'a>(
    templates: impl Iterator<Item = &'a PermissionTemplate>,
) -> AppResult<PermissionTree> {
    let mut domains: Vec<DomainPermissions> = Vec::new();

    for template in templates {
        let domain_index = match domains
            .iter()
            .position(|domain| domain.domain == template.domain)
        {
            Some(index) => index,
            None => {
                domains.push(DomainPermissions {
                    domain: template.domain.clone(),
                    resources: Vec::new(),
                });
                domains.len() - 1
            }
        };
        let resources = &mut domains[domain_index].resources;

        let resource_index = match resources
            .iter()
            .position(|resource| resource.resource == template.resource)
        {
            Some(index) => index,
            None => {
                resources.push(ResourcePermissions {
                    resource: template.resource.clone(),
                    resource_name: template.resource_name.clone(),
                    actions: Vec::new(),
                });
                resources.len() - 1
            }
        };

        resources[resource_index].actions.push(ActionPermission {
            action: template.action.clone(),
            action_name: template.action_name.clone(),
            is_default: u8::from(template.is_default),
            sort_order: template.sort_order,
            is_active: 1,
        });
    }

    PermissionTree::new(domains)
}
