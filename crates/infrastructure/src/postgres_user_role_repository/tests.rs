use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use vigil_application::{NewRole, NewUserRoleAssignment, RoleRepository, UserRoleRepository};
use vigil_core::{AppError, UserId};
use vigil_domain::{PermissionTree, RoleCode, RoleDomain};

use super::PostgresUserRoleRepository;
use crate::PostgresRoleRepository;

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
        panic!("failed to run migrations for postgres user role tests: {error}");
    }

    Some(pool)
}

fn nonce() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn user(id: i64) -> UserId {
    UserId::new(id).unwrap_or_else(|_| unreachable!())
}

async fn ensure_role(pool: &PgPool) -> i64 {
    let code = RoleCode::new(format!("member_{}", nonce())).unwrap_or_else(|_| unreachable!());
    let created = PostgresRoleRepository::new(pool.clone())
        .create_role(NewRole {
            code,
            name: "Member".to_owned(),
            domain: RoleDomain::Global,
            space_role_type: None,
            is_super_admin: false,
            is_builtin: false,
            permissions: PermissionTree::empty(),
            description: None,
            created_by: None,
        })
        .await;

    match created {
        Ok(role) => role.id,
        Err(error) => panic!("failed to create role in test: {error}"),
    }
}

#[tokio::test]
async fn active_pair_is_unique_until_revoked() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresUserRoleRepository::new(pool.clone());
    let role_id = ensure_role(&pool).await;
    let user_id = user(nonce() % 1_000_000_000 + 1);
    let new_assignment = NewUserRoleAssignment {
        user_id,
        role_id,
        assigned_by: Some(user(1)),
        expired_at: None,
    };

    let Ok(first) = repository.create_assignment(new_assignment.clone()).await else {
        panic!("failed to create assignment");
    };
    assert!(matches!(
        repository.create_assignment(new_assignment.clone()).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(repository.count_active_for_role(role_id).await, Ok(1)));

    assert!(matches!(
        repository.revoke_assignment(first.id, Some(user(1))).await,
        Ok(true)
    ));
    assert!(matches!(
        repository.revoke_assignment(first.id, Some(user(1))).await,
        Ok(false)
    ));
    assert!(matches!(
        repository.find_active_assignment(user_id, role_id).await,
        Ok(None)
    ));

    let second = repository.create_assignment(new_assignment).await;
    assert!(matches!(second, Ok(assignment) if assignment.id != first.id));
}

#[tokio::test]
async fn list_expired_returns_only_lapsed_active_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresUserRoleRepository::new(pool.clone());
    let role_id = ensure_role(&pool).await;
    let now = Utc::now();

    let lapsed = repository
        .create_assignment(NewUserRoleAssignment {
            user_id: user(2),
            role_id,
            assigned_by: None,
            expired_at: Some(now - Duration::minutes(5)),
        })
        .await;
    let current = repository
        .create_assignment(NewUserRoleAssignment {
            user_id: user(3),
            role_id,
            assigned_by: None,
            expired_at: Some(now + Duration::days(1)),
        })
        .await;
    let (Ok(lapsed), Ok(current)) = (lapsed, current) else {
        panic!("failed to create assignments");
    };

    let expired = repository.list_expired(now).await.unwrap_or_default();
    assert!(expired.iter().any(|assignment| assignment.id == lapsed.id));
    assert!(!expired.iter().any(|assignment| assignment.id == current.id));

    let members = repository
        .list_active_for_role(role_id)
        .await
        .unwrap_or_default();
    assert_eq!(members.len(), 2);
}
