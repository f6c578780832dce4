//! Audit Log Repository

use sqlx::{SqliteConnection, SqlitePool};

use crate::audit::entity::AuditLog;
use crate::shared::database::Database;
use crate::shared::error::Result;

pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn insert_in(conn: &mut SqliteConnection, log: &AuditLog) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, entity_type, entity_id, operation, operation_json, principal_id, performed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.entity_type)
        .bind(&log.entity_id)
        .bind(&log.operation)
        .bind(&log.operation_json)
        .bind(&log.principal_id)
        .bind(log.performed_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Audit trail of one entity, oldest first.
    pub async fn find_by_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditLog>> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, entity_type, entity_id, operation, operation_json, principal_id, performed_at
            FROM audit_logs
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY performed_at, id
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
