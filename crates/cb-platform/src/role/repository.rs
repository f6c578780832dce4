//! Role Repository

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::role::entity::{BarclampId, Role, RoleValidationError};
use crate::role_element_order::RoleElementOrderRepository;
use crate::role_instance::RoleInstanceRepository;
use crate::shared::database::Database;
use crate::shared::error::Result;
use crate::usecase::{Aggregate, UseCaseError};

const SELECT_ROLE: &str = r#"
    SELECT id, name, states, "order", description, barclamp_id, created_at, updated_at, created_by
    FROM roles
"#;

pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!("{} WHERE id = ?", SELECT_ROLE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// Role named `name` in `barclamp_id`, ignoring case.
    pub async fn find_by_name(&self, barclamp_id: BarclampId, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "{} WHERE barclamp_id = ? AND name = ? COLLATE NOCASE",
            SELECT_ROLE
        ))
        .bind(barclamp_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    /// Whether another role already uses `name` in `barclamp_id`, ignoring
    /// case. `excluding` skips the role being updated.
    pub async fn exists_by_name(
        &self,
        barclamp_id: BarclampId,
        name: &str,
        excluding: Option<&str>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM roles
             WHERE barclamp_id = ? AND name = ? COLLATE NOCASE AND (? IS NULL OR id <> ?)",
        )
        .bind(barclamp_id)
        .bind(name)
        .bind(excluding)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Roles of one barclamp in execution order.
    pub async fn find_by_barclamp(&self, barclamp_id: BarclampId) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            r#"{} WHERE barclamp_id = ? ORDER BY "order", name COLLATE NOCASE"#,
            SELECT_ROLE
        ))
        .bind(barclamp_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn find_all(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            r#"{} ORDER BY barclamp_id, "order", name COLLATE NOCASE"#,
            SELECT_ROLE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }
}

/// Children deleted together with a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCascade {
    pub element_orders: u64,
    pub instances: u64,
}

#[async_trait]
impl Aggregate for Role {
    type Removed = RoleCascade;

    fn id(&self) -> &str {
        &self.id
    }

    fn table_name() -> &'static str {
        "roles"
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, states, "order", description, barclamp_id, created_at, updated_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.states)
        .bind(self.order)
        .bind(&self.description)
        .bind(self.barclamp_id)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(&self.created_by)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut SqliteConnection) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE roles SET
                name = ?,
                states = ?,
                "order" = ?,
                description = ?,
                barclamp_id = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&self.name)
        .bind(&self.states)
        .bind(self.order)
        .bind(&self.description)
        .bind(self.barclamp_id)
        .bind(self.updated_at)
        .bind(&self.id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Children go first, then the role row itself.
    async fn remove(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<Option<RoleCascade>, sqlx::Error> {
        let element_orders = RoleElementOrderRepository::delete_by_role_in(&mut *conn, &self.id).await?;
        let instances = RoleInstanceRepository::delete_by_role_in(&mut *conn, &self.id).await?;
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(&self.id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(RoleCascade {
            element_orders,
            instances,
        }))
    }

    /// Only the `(barclamp_id, name)` index can reject a role write.
    fn on_unique_violation(&self) -> UseCaseError {
        RoleValidationError::DuplicateName {
            name: self.name.clone(),
            barclamp_id: self.barclamp_id,
        }
        .into()
    }

    fn on_missing(&self) -> UseCaseError {
        UseCaseError::not_found("ROLE_NOT_FOUND", format!("Role with ID '{}' not found", self.id))
    }
}
