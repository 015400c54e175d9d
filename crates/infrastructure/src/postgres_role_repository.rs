use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use vigil_application::{NewRole, Role, RoleListQuery, RoleRepository, UpdateRoleInput};
use vigil_core::{AppError, AppResult, UserId};
use vigil_domain::{PermissionTree, RoleCode, RoleDomain};

/// PostgreSQL-backed repository for role definitions.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    code: String,
    name: String,
    domain: String,
    space_role_type: Option<String>,
    is_super_admin: bool,
    is_builtin: bool,
    is_disabled: bool,
    permissions: serde_json::Value,
    description: Option<String>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let id = self.id;
        let corrupt =
            |error: AppError| AppError::Internal(format!("stored role {id} is invalid: {error}"));

        Ok(Role {
            id,
            code: RoleCode::new(self.code).map_err(corrupt)?,
            name: self.name,
            domain: RoleDomain::from_str(self.domain.as_str()).map_err(corrupt)?,
            space_role_type: self.space_role_type,
            is_super_admin: self.is_super_admin,
            is_builtin: self.is_builtin,
            is_disabled: self.is_disabled,
            permissions: PermissionTree::from_value(self.permissions).map_err(corrupt)?,
            description: self.description,
            created_by: self
                .created_by
                .map(UserId::new)
                .transpose()
                .map_err(corrupt)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (
                code,
                name,
                domain,
                space_role_type,
                is_super_admin,
                is_builtin,
                permissions,
                description,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, code, name, domain, space_role_type, is_super_admin, is_builtin,
                is_disabled, permissions, description, created_by, created_at, updated_at
            "#,
        )
        .bind(role.code.as_str())
        .bind(role.name.as_str())
        .bind(role.domain.as_str())
        .bind(role.space_role_type.as_deref())
        .bind(role.is_super_admin)
        .bind(role.is_builtin)
        .bind(Json(&role.permissions))
        .bind(role.description.as_deref())
        .bind(role.created_by.map(|user_id| user_id.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.code.as_str()))?;

        row.into_role()
    }

    async fn update_role(&self, role_id: i64, input: UpdateRoleInput) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE roles
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                space_role_type = COALESCE($4, space_role_type),
                is_disabled = COALESCE($5, is_disabled),
                permissions = COALESCE($6, permissions),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING
                id, code, name, domain, space_role_type, is_super_admin, is_builtin,
                is_disabled, permissions, description, created_by, created_at, updated_at
            "#,
        )
        .bind(role_id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.space_role_type.as_deref())
        .bind(input.is_disabled)
        .bind(input.permissions.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role {role_id} was not found")))?;

        row.into_role()
    }

    async fn soft_delete_role(&self, role_id: i64) -> AppResult<()> {
        let deleted = sqlx::query(
            r#"
            UPDATE roles
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound(format!("role {role_id} was not found")));
        }

        Ok(())
    }

    async fn find_role(&self, role_id: i64) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id, code, name, domain, space_role_type, is_super_admin, is_builtin,
                is_disabled, permissions, description, created_by, created_at, updated_at
            FROM roles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id, code, name, domain, space_role_type, is_super_admin, is_builtin,
                is_disabled, permissions, description, created_by, created_at, updated_at
            FROM roles
            WHERE code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by code: {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Vec<Role>> {
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty());
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id, code, name, domain, space_role_type, is_super_admin, is_builtin,
                is_disabled, permissions, description, created_by, created_at, updated_at
            FROM roles
            WHERE deleted_at IS NULL
                AND ($1::text IS NULL OR domain = $1)
                AND ($2 OR NOT is_disabled)
                AND (
                    $3::text IS NULL
                    OR strpos(lower(code), lower($3)) > 0
                    OR strpos(lower(name), lower($3)) > 0
                )
            ORDER BY id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.domain.map(|domain| domain.as_str()))
        .bind(query.include_disabled)
        .bind(keyword)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }
}

fn map_role_conflict(error: sqlx::Error, code: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role code '{code}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}
