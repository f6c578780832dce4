//! Event Repository

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::event::entity::Event;
use crate::shared::database::Database;
use crate::shared::error::Result;

const SELECT_EVENT: &str = r#"
    SELECT id, event_type, source, subject, time, data, spec_version, message_group,
           correlation_id, causation_id, principal_id, created_at
    FROM events
"#;

pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Store `event` on `conn`; the unit of work calls this inside its
    /// transaction.
    pub async fn insert_in(conn: &mut SqliteConnection, event: &Event) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO events (id, event_type, source, subject, time, data, spec_version, message_group,
                                correlation_id, causation_id, principal_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.event_type)
        .bind(&event.source)
        .bind(&event.subject)
        .bind(event.time)
        .bind(event.data.to_string())
        .bind(&event.spec_version)
        .bind(&event.message_group)
        .bind(&event.correlation_id)
        .bind(&event.causation_id)
        .bind(&event.principal_id)
        .bind(event.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Events about one subject, oldest first.
    pub async fn find_by_subject(&self, subject: &str) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!("{} WHERE subject = ? ORDER BY time, id", SELECT_EVENT))
            .bind(subject)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_row).collect()
    }

    pub async fn find_by_type(&self, event_type: &str) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!("{} WHERE event_type = ? ORDER BY time, id", SELECT_EVENT))
            .bind(event_type)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(parse_row).collect()
    }
}

fn parse_row(row: &SqliteRow) -> Result<Event> {
    let data: String = row.try_get("data")?;
    Ok(Event {
        id: row.try_get("id")?,
        event_type: row.try_get("event_type")?,
        source: row.try_get("source")?,
        subject: row.try_get("subject")?,
        time: row.try_get("time")?,
        data: serde_json::from_str(&data)?,
        spec_version: row.try_get("spec_version")?,
        message_group: row.try_get("message_group")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        principal_id: row.try_get("principal_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event(subject: &str, event_type: &str) -> Event {
        Event {
            id: crate::TsidGenerator::generate(),
            event_type: event_type.to_string(),
            source: "crowbar:config".to_string(),
            subject: subject.to_string(),
            time: Utc::now(),
            data: json!({ "roleId": "abc", "order": 5 }),
            spec_version: "1.0".to_string(),
            message_group: "crowbar:role:abc".to_string(),
            correlation_id: "corr-1".to_string(),
            causation_id: None,
            principal_id: "admin".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_query() {
        let db = Database::in_memory().await.unwrap();
        let repo = EventRepository::new(&db);

        let mut conn = db.pool().acquire().await.unwrap();
        EventRepository::insert_in(&mut *conn, &event("crowbar.role.abc", "crowbar:config:role:created"))
            .await
            .unwrap();
        EventRepository::insert_in(&mut *conn, &event("crowbar.role.abc", "crowbar:config:role:updated"))
            .await
            .unwrap();
        EventRepository::insert_in(&mut *conn, &event("crowbar.role.xyz", "crowbar:config:role:created"))
            .await
            .unwrap();
        drop(conn);

        let by_subject = repo.find_by_subject("crowbar.role.abc").await.unwrap();
        assert_eq!(by_subject.len(), 2);
        assert_eq!(by_subject[0].data["order"], 5);
        assert!(by_subject[0].causation_id.is_none());

        let created = repo.find_by_type("crowbar:config:role:created").await.unwrap();
        assert_eq!(created.len(), 2);
    }
}
