use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleInstance {
    pub id: String,
    pub role_id: String,
    pub node_id: String,
    pub created_at: DateTime<Utc>,
}

impl RoleInstance {
    pub fn new(role_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            id: TsidGenerator::generate(),
            role_id: role_id.into(),
            node_id: node_id.into(),
            created_at: Utc::now(),
        }
    }
}
