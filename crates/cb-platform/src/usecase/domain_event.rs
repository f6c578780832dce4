//! Domain Event Trait
//!
//! Domain events record facts about what happened to an aggregate (past
//! tense: `RoleCreated`, not `CreateRole`). Their envelope follows the
//! CloudEvents structure, with extra fields for tracing and ordering.
//!
//! - Event type: `{app}:{domain}:{aggregate}:{action}`, e.g. `crowbar:config:role:created`
//! - Subject: `{app}.{aggregate}.{id}`, e.g. `crowbar.role.0HZXEQ5Y8JY5Z`
//! - Message group: `{app}:{aggregate}:{id}`; events in one group are ordered

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExecutionContext;
use crate::shared::tsid::TsidGenerator;

pub trait DomainEvent: Send + Sync {
    /// TSID of this event.
    fn event_id(&self) -> &str;

    fn event_type(&self) -> &str;

    /// Schema version of this event type (e.g., "1.0").
    fn spec_version(&self) -> &str;

    fn source(&self) -> &str;

    fn subject(&self) -> &str;

    fn time(&self) -> DateTime<Utc>;

    fn execution_id(&self) -> &str;

    fn correlation_id(&self) -> &str;

    fn causation_id(&self) -> Option<&str>;

    fn principal_id(&self) -> &str;

    fn message_group(&self) -> &str;

    /// Event payload serialized as JSON.
    fn to_data_json(&self) -> String;
}

/// Envelope fields shared by every event.
///
/// Event structs embed this as a `metadata` field and get their
/// [`DomainEvent`] impl from [`impl_domain_event!`](crate::impl_domain_event).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub spec_version: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub message_group: String,
}

impl EventMetadata {
    /// Envelope for a new event, with tracing ids copied from `ctx`.
    pub fn new(
        ctx: &ExecutionContext,
        event_type: &str,
        spec_version: &str,
        source: &str,
        subject: String,
        message_group: String,
    ) -> Self {
        Self {
            event_id: TsidGenerator::generate(),
            event_type: event_type.to_string(),
            spec_version: spec_version.to_string(),
            source: source.to_string(),
            subject,
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            causation_id: ctx.causation_id.clone(),
            principal_id: ctx.principal_id.clone(),
            message_group,
        }
    }
}

/// Implement [`DomainEvent`] by delegating to a `metadata: EventMetadata` field.
///
/// ```ignore
/// #[derive(Serialize)]
/// pub struct RoleCreated {
///     #[serde(flatten)]
///     pub metadata: EventMetadata,
///     pub role_id: String,
/// }
///
/// impl_domain_event!(RoleCreated);
/// ```
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn spec_version(&self) -> &str {
                &self.metadata.spec_version
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn causation_id(&self) -> Option<&str> {
                self.metadata.causation_id.as_deref()
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn message_group(&self) -> &str {
                &self.metadata.message_group
            }

            fn to_data_json(&self) -> String {
                serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    };
}
