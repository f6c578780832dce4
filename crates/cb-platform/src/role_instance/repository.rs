//! Role Instance Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::role::entity::Role;
use crate::role_instance::entity::RoleInstance;
use crate::shared::database::Database;
use crate::shared::error::{is_foreign_key_violation, PlatformError, Result};

const SELECT_INSTANCE: &str = "SELECT id, role_id, node_id, created_at FROM role_instances";

pub struct RoleInstanceRepository {
    pool: SqlitePool,
}

impl RoleInstanceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Fails with `NotFound` when the owning role does not exist.
    pub async fn insert(&self, instance: &RoleInstance) -> Result<()> {
        sqlx::query("INSERT INTO role_instances (id, role_id, node_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&instance.id)
            .bind(&instance.role_id)
            .bind(&instance.node_id)
            .bind(instance.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    PlatformError::not_found("Role", &instance.role_id)
                } else {
                    PlatformError::Database(e)
                }
            })?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<RoleInstance>> {
        let instance = sqlx::query_as::<_, RoleInstance>(&format!("{} WHERE id = ?", SELECT_INSTANCE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(instance)
    }

    pub async fn find_by_role(&self, role_id: &str) -> Result<Vec<RoleInstance>> {
        let instances = sqlx::query_as::<_, RoleInstance>(&format!(
            "{} WHERE role_id = ? ORDER BY node_id, id",
            SELECT_INSTANCE
        ))
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    pub async fn find_by_node(&self, node_id: &str) -> Result<Vec<RoleInstance>> {
        let instances = sqlx::query_as::<_, RoleInstance>(&format!(
            "{} WHERE node_id = ? ORDER BY id",
            SELECT_INSTANCE
        ))
        .bind(node_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    pub async fn count_by_role(&self, role_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_instances WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Follow the back-reference of instance `id` to its role.
    pub async fn find_owning_role(&self, id: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.states, r."order", r.description, r.barclamp_id,
                   r.created_at, r.updated_at, r.created_by
            FROM role_instances i
            JOIN roles r ON r.id = i.role_id
            WHERE i.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    /// Delete every instance of `role_id` on `conn`, usually inside the
    /// transaction that removes the role.
    pub async fn delete_by_role_in(
        conn: &mut SqliteConnection,
        role_id: &str,
    ) -> std::result::Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM role_instances WHERE role_id = ?")
            .bind(role_id)
            .execute(conn)
            .await?;
        debug!(role_id, deleted = result.rows_affected(), "Deleted role instances");
        Ok(result.rows_affected())
    }
}
