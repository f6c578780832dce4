//! Role Domain Events

use serde::{Deserialize, Serialize};

use crate::event::CLOUDEVENTS_SPEC_VERSION;
use crate::impl_domain_event;
use crate::role::entity::{BarclampId, Role};
use crate::usecase::domain_event::EventMetadata;
use crate::usecase::ExecutionContext;

const SOURCE: &str = "crowbar:config";

fn metadata(ctx: &ExecutionContext, event_type: &str, role_id: &str) -> EventMetadata {
    EventMetadata::new(
        ctx,
        event_type,
        CLOUDEVENTS_SPEC_VERSION,
        SOURCE,
        format!("crowbar.role.{}", role_id),
        format!("crowbar:role:{}", role_id),
    )
}

/// Event emitted when a role is created. Carries every persisted field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub role_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub barclamp_id: BarclampId,
}

impl_domain_event!(RoleCreated);

impl RoleCreated {
    const EVENT_TYPE: &'static str = "crowbar:config:role:created";

    pub fn new(ctx: &ExecutionContext, role: &Role) -> Self {
        Self {
            metadata: metadata(ctx, Self::EVENT_TYPE, &role.id),
            role_id: role.id.clone(),
            name: role.name.clone(),
            states: role.states.clone(),
            order: role.order,
            description: role.description.clone(),
            barclamp_id: role.barclamp_id,
        }
    }
}

/// Event emitted when a role is updated. Only changed fields are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barclamp_id: Option<BarclampId>,
}

impl_domain_event!(RoleUpdated);

impl RoleUpdated {
    const EVENT_TYPE: &'static str = "crowbar:config:role:updated";

    pub fn new(ctx: &ExecutionContext, role_id: &str) -> Self {
        Self {
            metadata: metadata(ctx, Self::EVENT_TYPE, role_id),
            role_id: role_id.to_string(),
            name: None,
            states: None,
            order: None,
            description: None,
            barclamp_id: None,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.states.is_some()
            || self.order.is_some()
            || self.description.is_some()
            || self.barclamp_id.is_some()
    }
}

/// Event emitted when a role and its children are deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDeleted {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub role_id: String,
    pub name: String,
    pub element_orders_removed: u64,
    pub instances_removed: u64,
}

impl_domain_event!(RoleDeleted);

impl RoleDeleted {
    const EVENT_TYPE: &'static str = "crowbar:config:role:deleted";

    pub fn new(
        ctx: &ExecutionContext,
        role_id: &str,
        name: &str,
        element_orders_removed: u64,
        instances_removed: u64,
    ) -> Self {
        Self {
            metadata: metadata(ctx, Self::EVENT_TYPE, role_id),
            role_id: role_id.to_string(),
            name: name.to_string(),
            element_orders_removed,
            instances_removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::DomainEvent;

    #[test]
    fn test_role_created_envelope() {
        let ctx = ExecutionContext::create("admin");
        let role = Role::new("compute", BarclampId(1)).with_priority(5);
        let event = RoleCreated::new(&ctx, &role);

        assert_eq!(event.event_type(), "crowbar:config:role:created");
        assert_eq!(event.source(), "crowbar:config");
        assert_eq!(event.spec_version(), "1.0");
        assert_eq!(event.subject(), format!("crowbar.role.{}", role.id));
        assert_eq!(event.message_group(), format!("crowbar:role:{}", role.id));
        assert_eq!(event.principal_id(), "admin");

        let data: serde_json::Value = serde_json::from_str(&event.to_data_json()).unwrap();
        assert_eq!(data["order"], 5);
        assert_eq!(data["barclampId"], 1);
    }

    #[test]
    fn test_role_updated_only_changed_fields() {
        let ctx = ExecutionContext::create("admin");
        let mut event = RoleUpdated::new(&ctx, "abc");
        assert!(!event.has_changes());

        event.order = Some(3);
        assert!(event.has_changes());

        let data: serde_json::Value = serde_json::from_str(&event.to_data_json()).unwrap();
        assert_eq!(data["order"], 3);
        assert!(data.get("name").is_none());
        assert!(data.get("barclampId").is_none());
    }
}
