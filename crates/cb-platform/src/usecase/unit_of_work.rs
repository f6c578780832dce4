//! Unit of Work
//!
//! Atomic commit of entity state changes, domain events, and audit logs
//! within a single SQLite transaction.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, warn};

use super::domain_event::DomainEvent;
use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::audit::{AuditLog, AuditLogRepository};
use crate::event::{Event, EventRepository};
use crate::shared::error::is_unique_violation;

/// An entity the unit of work knows how to write and remove.
///
/// Writes take a bare connection so they can run inside the commit
/// transaction alongside the event and audit inserts.
#[async_trait]
pub trait Aggregate: Send + Sync {
    /// What `remove` deleted along with the aggregate.
    type Removed: Default + Send + Sync;

    fn id(&self) -> &str;

    fn table_name() -> &'static str
    where
        Self: Sized;

    /// Insert a new row. Fails if the id is already taken.
    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    /// Overwrite the existing row. `false` when no row has this id.
    async fn update(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error>;

    /// Delete this aggregate together with anything it owns. `None` when
    /// no row has this id.
    async fn remove(&self, conn: &mut SqliteConnection)
        -> Result<Option<Self::Removed>, sqlx::Error>;

    /// Error reported when a unique constraint rejects a write.
    fn on_unique_violation(&self) -> UseCaseError {
        UseCaseError::concurrency(
            "UNIQUE_VIOLATION",
            format!("A conflicting record was written concurrently for {}", self.id()),
        )
    }

    /// Error reported when `update` or `remove` finds no row.
    fn on_missing(&self) -> UseCaseError {
        UseCaseError::not_found("NOT_FOUND", format!("No record with ID '{}'", self.id()))
    }
}

/// Unit of Work for atomic catalog mutations.
///
/// **This is the ONLY way to create a successful `UseCaseResult`.**
/// `UseCaseResult::success()` is crate-private, so every use case that
/// reports success has stored its event and audit row with the change.
///
/// ```ignore
/// pub async fn execute(&self, cmd: CreateRoleCommand, ctx: ExecutionContext)
///     -> UseCaseResult<RoleCreated>
/// {
///     if let Err(e) = validate_name(&cmd.name) {
///         return UseCaseResult::failure(e.into());
///     }
///
///     let role = Role::new(&cmd.name, cmd.barclamp_id);
///     let event = RoleCreated::new(&ctx, &role);
///
///     self.unit_of_work.commit(&role, event, &cmd).await
/// }
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Within one transaction: insert the aggregate, store the event, write
    /// the audit row. Any failure rolls back all three.
    async fn commit<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync;

    /// Same as [`commit`](Self::commit) but overwrites an existing row.
    /// Fails with the aggregate's `on_missing` error if the row is gone.
    async fn commit_update<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync;

    /// Removes the aggregate, then builds the event from what the removal
    /// deleted, inside the same transaction.
    async fn commit_delete<E, T, C, F>(
        &self,
        aggregate: &T,
        build_event: F,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
        F: FnOnce(&T::Removed) -> E + Send;
}

#[derive(Clone)]
pub struct SqliteUnitOfWork {
    pool: SqlitePool,
}

impl SqliteUnitOfWork {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Aggregate type from a subject such as `crowbar.role.0HZX...` → `Role`.
    fn extract_aggregate_type(subject: &str) -> String {
        subject
            .split('.')
            .nth(1)
            .map(|s| {
                let mut chars = s.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn extract_entity_id(subject: &str) -> Option<String> {
        subject.split('.').nth(2).map(String::from)
    }

    fn create_event<E: DomainEvent>(event: &E) -> Event {
        let data = serde_json::from_str(&event.to_data_json()).unwrap_or(serde_json::json!({}));

        Event {
            id: event.event_id().to_string(),
            event_type: event.event_type().to_string(),
            source: event.source().to_string(),
            subject: event.subject().to_string(),
            time: event.time(),
            data,
            spec_version: event.spec_version().to_string(),
            message_group: event.message_group().to_string(),
            correlation_id: event.correlation_id().to_string(),
            causation_id: event.causation_id().map(String::from),
            principal_id: event.principal_id().to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Audit row named after the command type, e.g. `CreateRoleCommand`.
    fn create_audit_log<E: DomainEvent, C: Serialize>(event: &E, command: &C) -> AuditLog {
        let command_name = std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string();

        AuditLog::new(
            Self::extract_aggregate_type(event.subject()),
            Self::extract_entity_id(event.subject()),
            command_name,
            serde_json::to_string(command).ok(),
            Some(event.principal_id().to_string()),
        )
        .with_performed_at(event.time())
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, UseCaseError> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            UseCaseError::commit(format!("Failed to start transaction: {}", e))
        })
    }

    fn write_failed<T: Aggregate>(aggregate: &T, e: sqlx::Error) -> UseCaseError {
        if is_unique_violation(&e) {
            warn!(
                table = T::table_name(),
                id = aggregate.id(),
                "Unique constraint rejected aggregate write"
            );
            return aggregate.on_unique_violation();
        }
        error!("Failed to write aggregate: {}", e);
        UseCaseError::commit(format!("Failed to write aggregate: {}", e))
    }

    fn missing<T: Aggregate>(aggregate: &T) -> UseCaseError {
        warn!(
            table = T::table_name(),
            id = aggregate.id(),
            "Aggregate row vanished before commit"
        );
        aggregate.on_missing()
    }

    /// Stores the event and audit row, then commits. Runs after the entity
    /// change has been written to `tx`.
    async fn finish<E, C>(
        mut tx: Transaction<'static, Sqlite>,
        table: &'static str,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync,
    {
        let stored_event = Self::create_event(&event);
        if let Err(e) = EventRepository::insert_in(&mut *tx, &stored_event).await {
            let _ = tx.rollback().await;
            error!("Failed to insert event: {}", e);
            return UseCaseResult::failure(UseCaseError::commit(format!(
                "Failed to insert event: {}",
                e
            )));
        }

        let audit_log = Self::create_audit_log(&event, command);
        if let Err(e) = AuditLogRepository::insert_in(&mut *tx, &audit_log).await {
            let _ = tx.rollback().await;
            error!("Failed to insert audit log: {}", e);
            return UseCaseResult::failure(UseCaseError::commit(format!(
                "Failed to insert audit log: {}",
                e
            )));
        }

        if let Err(e) = tx.commit().await {
            error!("Failed to commit transaction: {}", e);
            return UseCaseResult::failure(UseCaseError::commit(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        debug!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            table,
            "Successfully committed transaction"
        );

        UseCaseResult::success(event)
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
    {
        let mut tx = match self.begin().await {
            Ok(tx) => tx,
            Err(e) => return UseCaseResult::failure(e),
        };

        if let Err(e) = aggregate.insert(&mut *tx).await {
            let _ = tx.rollback().await;
            return UseCaseResult::failure(Self::write_failed(aggregate, e));
        }

        Self::finish(tx, T::table_name(), event, command).await
    }

    async fn commit_update<E, T, C>(&self, aggregate: &T, event: E, command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
    {
        let mut tx = match self.begin().await {
            Ok(tx) => tx,
            Err(e) => return UseCaseResult::failure(e),
        };

        match aggregate.update(&mut *tx).await {
            Ok(true) => {}
            Ok(false) => {
                let _ = tx.rollback().await;
                return UseCaseResult::failure(Self::missing(aggregate));
            }
            Err(e) => {
                let _ = tx.rollback().await;
                return UseCaseResult::failure(Self::write_failed(aggregate, e));
            }
        }

        Self::finish(tx, T::table_name(), event, command).await
    }

    async fn commit_delete<E, T, C, F>(
        &self,
        aggregate: &T,
        build_event: F,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
        F: FnOnce(&T::Removed) -> E + Send,
    {
        let mut tx = match self.begin().await {
            Ok(tx) => tx,
            Err(e) => return UseCaseResult::failure(e),
        };

        let event = match aggregate.remove(&mut *tx).await {
            Ok(Some(removed)) => build_event(&removed),
            Ok(None) => {
                let _ = tx.rollback().await;
                return UseCaseResult::failure(Self::missing(aggregate));
            }
            Err(e) => {
                let _ = tx.rollback().await;
                return UseCaseResult::failure(Self::write_failed(aggregate, e));
            }
        };

        Self::finish(tx, T::table_name(), event, command).await
    }
}

/// Records event ids without touching storage.
#[cfg(test)]
pub struct InMemoryUnitOfWork {
    pub committed_events: std::sync::Mutex<Vec<String>>,
    pub committed_audit_logs: std::sync::Mutex<Vec<String>>,
    pub deleted_ids: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl InMemoryUnitOfWork {
    pub fn new() -> Self {
        Self {
            committed_events: std::sync::Mutex::new(Vec::new()),
            committed_audit_logs: std::sync::Mutex::new(Vec::new()),
            deleted_ids: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn event_count(&self) -> usize {
        self.committed_events.lock().unwrap().len()
    }

    fn record(&self, event_id: &str) {
        self.committed_events.lock().unwrap().push(event_id.to_string());
        self.committed_audit_logs
            .lock()
            .unwrap()
            .push(format!("{}-audit", event_id));
    }
}

#[cfg(test)]
#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit<E, T, C>(&self, _aggregate: &T, event: E, _command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
    {
        self.record(event.event_id());
        UseCaseResult::success(event)
    }

    async fn commit_update<E, T, C>(&self, _aggregate: &T, event: E, _command: &C) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
    {
        self.record(event.event_id());
        UseCaseResult::success(event)
    }

    /// Builds the event from an empty `Removed`; nothing is stored.
    async fn commit_delete<E, T, C, F>(
        &self,
        aggregate: &T,
        build_event: F,
        _command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        T: Aggregate,
        C: Serialize + Send + Sync,
        F: FnOnce(&T::Removed) -> E + Send,
    {
        let event = build_event(&T::Removed::default());
        self.record(event.event_id());
        self.deleted_ids.lock().unwrap().push(aggregate.id().to_string());
        UseCaseResult::success(event)
    }
}
