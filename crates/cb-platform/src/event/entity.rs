//! Event Entity
//!
//! CloudEvents-shaped event storage. Immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CLOUDEVENTS_SPEC_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Same TSID as the domain event it was built from
    pub id: String,

    /// Format: {application}:{subdomain}:{aggregate}:{action}
    #[serde(rename = "type")]
    pub event_type: String,

    pub source: String,

    /// e.g. `crowbar.role.0HZXEQ5Y8JY5Z`
    pub subject: String,

    pub time: DateTime<Utc>,

    /// Full event payload, envelope fields included
    pub data: serde_json::Value,

    pub spec_version: String,

    /// Events sharing a message group are ordered
    pub message_group: String,

    pub correlation_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,

    pub principal_id: String,

    pub created_at: DateTime<Utc>,
}
