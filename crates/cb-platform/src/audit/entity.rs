//! Audit Log Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,

    /// Entity type affected (e.g., "Role")
    pub entity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Command type name (e.g., "CreateRoleCommand")
    pub operation: String,

    /// Command payload as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_json: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    pub performed_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: Option<String>,
        operation: impl Into<String>,
        operation_json: Option<String>,
        principal_id: Option<String>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            entity_type: entity_type.into(),
            entity_id,
            operation: operation.into(),
            operation_json,
            principal_id,
            performed_at: Utc::now(),
        }
    }

    pub fn with_performed_at(mut self, time: DateTime<Utc>) -> Self {
        self.performed_at = time;
        self
    }
}
