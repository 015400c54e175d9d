use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use vigil_application::{NewUserRoleAssignment, UserRoleAssignment, UserRoleRepository};
use vigil_core::{AppError, AppResult, UserId};

/// PostgreSQL-backed repository for user-role assignment rows.
#[derive(Clone)]
pub struct PostgresUserRoleRepository {
    pool: PgPool,
}

impl PostgresUserRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: i64,
    user_id: i64,
    role_id: i64,
    assigned_by: Option<i64>,
    assigned_at: DateTime<Utc>,
    expired_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<UserRoleAssignment> {
        let id = self.id;
        let corrupt = |error: AppError| {
            AppError::Internal(format!("stored user role {id} is invalid: {error}"))
        };

        Ok(UserRoleAssignment {
            id,
            user_id: UserId::new(self.user_id).map_err(corrupt)?,
            role_id: self.role_id,
            assigned_by: self
                .assigned_by
                .map(UserId::new)
                .transpose()
                .map_err(corrupt)?,
            assigned_at: self.assigned_at,
            expired_at: self.expired_at,
        })
    }
}

fn into_assignments(rows: Vec<AssignmentRow>) -> AppResult<Vec<UserRoleAssignment>> {
    rows.into_iter().map(AssignmentRow::into_assignment).collect()
}

#[async_trait]
impl UserRoleRepository for PostgresUserRoleRepository {
    async fn find_active_assignment(
        &self,
        user_id: UserId,
        role_id: i64,
    ) -> AppResult<Option<UserRoleAssignment>> {
        sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at, expired_at
            FROM user_roles
            WHERE user_id = $1 AND role_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id.as_i64())
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user role: {error}")))?
        .map(AssignmentRow::into_assignment)
        .transpose()
    }

    async fn create_assignment(
        &self,
        assignment: NewUserRoleAssignment,
    ) -> AppResult<UserRoleAssignment> {
        sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_by, expired_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, role_id, assigned_by, assigned_at, expired_at
            "#,
        )
        .bind(assignment.user_id.as_i64())
        .bind(assignment.role_id)
        .bind(assignment.assigned_by.map(|user_id| user_id.as_i64()))
        .bind(assignment.expired_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "user {} already holds role {}",
                    assignment.user_id, assignment.role_id
                ));
            }

            AppError::Internal(format!("failed to create user role: {error}"))
        })?
        .into_assignment()
    }

    async fn revoke_assignment(
        &self,
        assignment_id: i64,
        revoked_by: Option<UserId>,
    ) -> AppResult<bool> {
        let revoked = sqlx::query(
            r#"
            UPDATE user_roles
            SET revoked_at = now(), revoked_by = $2
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(assignment_id)
        .bind(revoked_by.map(|user_id| user_id.as_i64()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke user role: {error}")))?
        .rows_affected();

        Ok(revoked > 0)
    }

    async fn count_active_for_role(&self, role_id: i64) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_roles
            WHERE role_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role members: {error}")))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_active_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at, expired_at
            FROM user_roles
            WHERE user_id = $1 AND revoked_at IS NULL
            ORDER BY assigned_at, id
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list user roles: {error}")))?;

        into_assignments(rows)
    }

    async fn list_active_for_role(&self, role_id: i64) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at, expired_at
            FROM user_roles
            WHERE role_id = $1 AND revoked_at IS NULL
            ORDER BY assigned_at, id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role members: {error}")))?;

        into_assignments(rows)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at, expired_at
            FROM user_roles
            WHERE revoked_at IS NULL
                AND expired_at IS NOT NULL
                AND expired_at <= $1
            ORDER BY expired_at, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list expired user roles: {error}"))
        })?;

        into_assignments(rows)
    }
}

#[cfg(test)]
mod tests;
