use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use vigil_application::{PermissionTemplate, PermissionTemplateRepository};
use vigil_core::{AppError, AppResult};

/// PostgreSQL-backed permission template catalog.
#[derive(Clone)]
pub struct PostgresPermissionTemplateRepository {
    pool: PgPool,
}

impl PostgresPermissionTemplateRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: i64,
    template_code: String,
    domain: String,
    resource: String,
    resource_name: String,
    action: String,
    action_name: String,
    is_default: bool,
    sort_order: i32,
    is_active: bool,
}

impl From<TemplateRow> for PermissionTemplate {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id,
            template_code: row.template_code,
            domain: row.domain,
            resource: row.resource,
            resource_name: row.resource_name,
            action: row.action,
            action_name: row.action_name,
            is_default: row.is_default,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl PermissionTemplateRepository for PostgresPermissionTemplateRepository {
    async fn list_templates(&self, domain: Option<&str>) -> AppResult<Vec<PermissionTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT
                id,
                template_code,
                domain,
                resource,
                resource_name,
                action,
                action_name,
                is_default,
                sort_order,
                is_active
            FROM permission_templates
            WHERE $1::text IS NULL OR domain = $1
            ORDER BY sort_order, id
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission templates: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionTemplate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use vigil_application::PermissionTemplateRepository;

    use super::PostgresPermissionTemplateRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for permission template tests: {error}");
        }

        Some(pool)
    }

    #[tokio::test]
    async fn seeded_catalog_is_filterable_by_domain() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresPermissionTemplateRepository::new(pool);

        let workspace = repository
            .list_templates(Some("workspace"))
            .await
            .unwrap_or_default();
        assert!(!workspace.is_empty());
        assert!(
            workspace
                .iter()
                .all(|template| template.domain == "workspace")
        );
        assert!(workspace.iter().any(|template| {
            template.resource == "workflow" && template.action == "create"
        }));

        let all = repository.list_templates(None).await.unwrap_or_default();
        assert!(all.len() > workspace.len());
        assert!(
            all.windows(2)
                .all(|pair| (pair[0].sort_order, pair[0].id) <= (pair[1].sort_order, pair[1].id))
        );
    }
}
