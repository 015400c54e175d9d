use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use vigil_application::{NewRole, Role, RoleListQuery, RoleRepository, UpdateRoleInput};
use vigil_core::{AppError, AppResult};

/// In-memory role repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    state: RwLock<RoleTable>,
}

#[derive(Debug, Default)]
struct RoleTable {
    last_id: i64,
    live: BTreeMap<i64, Role>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let mut state = self.state.write().await;

        if state.live.values().any(|stored| stored.code == role.code) {
            return Err(AppError::Conflict(format!(
                "role code '{}' already exists",
                role.code
            )));
        }

        state.last_id += 1;
        let now = Utc::now();
        let created = Role {
            id: state.last_id,
            code: role.code,
            name: role.name,
            domain: role.domain,
            space_role_type: role.space_role_type,
            is_super_admin: role.is_super_admin,
            is_builtin: role.is_builtin,
            is_disabled: false,
            permissions: role.permissions,
            description: role.description,
            created_by: role.created_by,
            created_at: now,
            updated_at: now,
        };

        state.live.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_role(&self, role_id: i64, input: UpdateRoleInput) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let role = state
            .live
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} was not found")))?;

        if let Some(name) = input.name {
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = Some(description);
        }
        if let Some(space_role_type) = input.space_role_type {
            role.space_role_type = Some(space_role_type);
        }
        if let Some(is_disabled) = input.is_disabled {
            role.is_disabled = is_disabled;
        }
        if let Some(permissions) = input.permissions {
            role.permissions = permissions;
        }
        role.updated_at = Utc::now();

        Ok(role.clone())
    }

    async fn soft_delete_role(&self, role_id: i64) -> AppResult<()> {
        self.state
            .write()
            .await
            .live
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} was not found")))
    }

    async fn find_role(&self, role_id: i64) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.live.get(&role_id).cloned())
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .live
            .values()
            .find(|role| role.code.as_str() == code)
            .cloned())
    }

    async fn list_roles(&self, query: &RoleListQuery) -> AppResult<Vec<Role>> {
        Ok(self
            .state
            .read()
            .await
            .live
            .values()
            .filter(|role| query.matches(role))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}
