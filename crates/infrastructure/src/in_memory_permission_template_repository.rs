use async_trait::async_trait;
use vigil_application::{PermissionTemplate, PermissionTemplateRepository};
use vigil_core::AppResult;

/// In-memory permission template catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPermissionTemplateRepository {
    templates: Vec<PermissionTemplate>,
}

impl InMemoryPermissionTemplateRepository {
    /// Creates a catalog holding the provided templates.
    #[must_use]
    pub fn new(templates: Vec<PermissionTemplate>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl PermissionTemplateRepository for InMemoryPermissionTemplateRepository {
    async fn list_templates(&self, domain: Option<&str>) -> AppResult<Vec<PermissionTemplate>> {
        let mut templates = self
            .templates
            .iter()
            .filter(|template| domain.is_none_or(|domain| template.domain == domain))
            .cloned()
            .collect::<Vec<_>>();
        templates.sort_by_key(|template| (template.sort_order, template.id));

        Ok(templates)
    }
}
