use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vigil_application::{NewUserRoleAssignment, UserRoleAssignment, UserRoleRepository};
use vigil_core::{AppError, AppResult, UserId};

/// In-memory user-role assignment repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryUserRoleRepository {
    state: RwLock<AssignmentTable>,
}

#[derive(Debug, Default)]
struct AssignmentTable {
    last_id: i64,
    active: BTreeMap<i64, UserRoleAssignment>,
}

impl InMemoryUserRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn collect_sorted<'a>(
    assignments: impl Iterator<Item = &'a UserRoleAssignment>,
) -> Vec<UserRoleAssignment> {
    let mut values = assignments.cloned().collect::<Vec<_>>();
    values.sort_by_key(|assignment| (assignment.assigned_at, assignment.id));
    values
}

#[async_trait]
impl UserRoleRepository for InMemoryUserRoleRepository {
    async fn find_active_assignment(
        &self,
        user_id: UserId,
        role_id: i64,
    ) -> AppResult<Option<UserRoleAssignment>> {
        Ok(self
            .state
            .read()
            .await
            .active
            .values()
            .find(|assignment| assignment.user_id == user_id && assignment.role_id == role_id)
            .cloned())
    }

    async fn create_assignment(
        &self,
        assignment: NewUserRoleAssignment,
    ) -> AppResult<UserRoleAssignment> {
        let mut state = self.state.write().await;

        if state.active.values().any(|stored| {
            stored.user_id == assignment.user_id && stored.role_id == assignment.role_id
        }) {
            return Err(AppError::Conflict(format!(
                "user {} already holds role {}",
                assignment.user_id, assignment.role_id
            )));
        }

        state.last_id += 1;
        let created = UserRoleAssignment {
            id: state.last_id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            assigned_by: assignment.assigned_by,
            assigned_at: Utc::now(),
            expired_at: assignment.expired_at,
        };

        state.active.insert(created.id, created.clone());
        Ok(created)
    }

    async fn revoke_assignment(
        &self,
        assignment_id: i64,
        _revoked_by: Option<UserId>,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .active
            .remove(&assignment_id)
            .is_some())
    }

    async fn count_active_for_role(&self, role_id: i64) -> AppResult<u64> {
        let count = self
            .state
            .read()
            .await
            .active
            .values()
            .filter(|assignment| assignment.role_id == role_id)
            .count();

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_active_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRoleAssignment>> {
        let state = self.state.read().await;
        Ok(collect_sorted(
            state
                .active
                .values()
                .filter(|assignment| assignment.user_id == user_id),
        ))
    }

    async fn list_active_for_role(&self, role_id: i64) -> AppResult<Vec<UserRoleAssignment>> {
        let state = self.state.read().await;
        Ok(collect_sorted(
            state
                .active
                .values()
                .filter(|assignment| assignment.role_id == role_id),
        ))
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<UserRoleAssignment>> {
        let state = self.state.read().await;
        let mut expired = state
            .active
            .values()
            .filter(|assignment| assignment.is_expired_at(now))
            .cloned()
            .collect::<Vec<_>>();
        expired.sort_by_key(|assignment| (assignment.expired_at, assignment.id));

        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use vigil_application::{NewUserRoleAssignment, UserRoleRepository};
    use vigil_core::{AppError, UserId};

    use super::InMemoryUserRoleRepository;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap_or_else(|_| unreachable!())
    }

    fn assignment(user_id: i64, role_id: i64) -> NewUserRoleAssignment {
        NewUserRoleAssignment {
            user_id: user(user_id),
            role_id,
            assigned_by: Some(user(1)),
            expired_at: None,
        }
    }

    #[tokio::test]
    async fn active_pair_conflicts_until_revoked() {
        let repository = InMemoryUserRoleRepository::new();

        let Ok(first) = repository.create_assignment(assignment(5, 2)).await else {
            panic!("failed to create assignment");
        };
        assert!(matches!(
            repository.create_assignment(assignment(5, 2)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(repository.count_active_for_role(2).await, Ok(1)));

        assert!(matches!(
            repository.revoke_assignment(first.id, None).await,
            Ok(true)
        ));
        assert!(matches!(
            repository.revoke_assignment(first.id, None).await,
            Ok(false)
        ));
        assert!(repository.create_assignment(assignment(5, 2)).await.is_ok());
    }

    #[tokio::test]
    async fn expired_listing_uses_inclusive_cutoff() {
        let repository = InMemoryUserRoleRepository::new();
        let now = Utc::now();

        let lapsed = repository
            .create_assignment(NewUserRoleAssignment {
                expired_at: Some(now),
                ..assignment(5, 2)
            })
            .await;
        let pending = repository
            .create_assignment(NewUserRoleAssignment {
                expired_at: Some(now + Duration::hours(1)),
                ..assignment(6, 2)
            })
            .await;
        assert!(lapsed.is_ok() && pending.is_ok());
        assert!(repository.create_assignment(assignment(7, 2)).await.is_ok());

        let expired = repository.list_expired(now).await.unwrap_or_default();
        assert_eq!(
            expired
                .iter()
                .map(|assignment| assignment.user_id)
                .collect::<Vec<_>>(),
            vec![user(5)]
        );
        assert_eq!(
            repository
                .list_active_for_role(2)
                .await
                .unwrap_or_default()
                .len(),
            3
        );
    }
}
