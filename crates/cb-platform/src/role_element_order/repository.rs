//! Role Element Order Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::role_element_order::entity::RoleElementOrder;
use crate::shared::database::Database;
use crate::shared::error::{is_foreign_key_violation, PlatformError, Result};

pub struct RoleElementOrderRepository {
    pool: SqlitePool,
}

impl RoleElementOrderRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Fails with `NotFound` when the owning role does not exist.
    pub async fn insert(&self, element_order: &RoleElementOrder) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO role_element_orders (id, role_id, "order", created_at) VALUES (?, ?, ?, ?)"#,
        )
        .bind(&element_order.id)
        .bind(&element_order.role_id)
        .bind(element_order.order)
        .bind(element_order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                PlatformError::not_found("Role", &element_order.role_id)
            } else {
                PlatformError::Database(e)
            }
        })?;
        Ok(())
    }

    pub async fn find_by_role(&self, role_id: &str) -> Result<Vec<RoleElementOrder>> {
        let rows = sqlx::query_as::<_, RoleElementOrder>(
            r#"SELECT id, role_id, "order", created_at FROM role_element_orders
               WHERE role_id = ? ORDER BY "order", id"#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_role(&self, role_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_element_orders WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Delete every element order of `role_id` on `conn`, usually inside
    /// the transaction that removes the role.
    pub async fn delete_by_role_in(
        conn: &mut SqliteConnection,
        role_id: &str,
    ) -> std::result::Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM role_element_orders WHERE role_id = ?")
            .bind(role_id)
            .execute(conn)
            .await?;
        debug!(role_id, deleted = result.rows_affected(), "Deleted role element orders");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::{BarclampId, Role};
    use crate::usecase::Aggregate;

    async fn setup_role(db: &Database) -> Role {
        let role = Role::new("compute", BarclampId(1));
        let mut conn = db.pool().acquire().await.unwrap();
        role.insert(&mut *conn).await.unwrap();
        role
    }

    #[tokio::test]
    async fn test_insert_and_find_sorted() {
        let db = Database::in_memory().await.unwrap();
        let repo = RoleElementOrderRepository::new(&db);
        let role = setup_role(&db).await;

        repo.insert(&RoleElementOrder::new(&role.id, 20)).await.unwrap();
        repo.insert(&RoleElementOrder::new(&role.id, 10)).await.unwrap();

        let orders: Vec<i32> = repo
            .find_by_role(&role.id)
            .await
            .unwrap()
            .iter()
            .map(|o| o.order)
            .collect();
        assert_eq!(orders, vec![10, 20]);
        assert_eq!(repo.count_by_role(&role.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_for_missing_role() {
        let db = Database::in_memory().await.unwrap();
        let repo = RoleElementOrderRepository::new(&db);

        let err = repo
            .insert(&RoleElementOrder::new("missing", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_role() {
        let db = Database::in_memory().await.unwrap();
        let repo = RoleElementOrderRepository::new(&db);
        let role = setup_role(&db).await;
        repo.insert(&RoleElementOrder::new(&role.id, 1)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let deleted = RoleElementOrderRepository::delete_by_role_in(&mut *conn, &role.id)
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        drop(conn);
        assert_eq!(repo.count_by_role(&role.id).await.unwrap(), 0);
    }
}
