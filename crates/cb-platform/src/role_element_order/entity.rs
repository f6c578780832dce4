use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleElementOrder {
    pub id: String,

    /// Owning role
    pub role_id: String,

    /// Execution group; lower runs first
    pub order: i32,

    pub created_at: DateTime<Utc>,
}

impl RoleElementOrder {
    pub fn new(role_id: impl Into<String>, order: i32) -> Self {
        Self {
            id: TsidGenerator::generate(),
            role_id: role_id.into(),
            order,
            created_at: Utc::now(),
        }
    }
}
