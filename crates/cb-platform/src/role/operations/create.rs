//! Create Role Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::RoleCreated;
use crate::role::entity::{validate_name, BarclampId, Role, RoleValidationError, DEFAULT_ORDER};
use crate::role::repository::RoleRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Command for creating a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleCommand {
    /// Must match `^[a-zA-Z][_a-zA-Z0-9]*$`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,

    /// Defaults to [`DEFAULT_ORDER`]; also accepted as `priority`
    #[serde(default, alias = "priority", skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub barclamp_id: BarclampId,
}

/// Use case for creating a new role.
pub struct CreateRoleUseCase<U: UnitOfWork> {
    role_repo: Arc<RoleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CreateRoleUseCase<U> {
    pub fn new(role_repo: Arc<RoleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            role_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CreateRoleCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<RoleCreated> {
        if let Err(e) = validate_name(&command.name) {
            return UseCaseResult::failure(e.into());
        }

        // Business rule: name is unique per barclamp, ignoring case
        match self
            .role_repo
            .exists_by_name(command.barclamp_id, &command.name, None)
            .await
        {
            Ok(false) => {}
            Ok(true) => {
                return UseCaseResult::failure(
                    RoleValidationError::DuplicateName {
                        name: command.name.clone(),
                        barclamp_id: command.barclamp_id,
                    }
                    .into(),
                );
            }
            Err(e) => {
                return UseCaseResult::failure(UseCaseError::commit(format!(
                    "Failed to check role name: {}",
                    e
                )));
            }
        }

        let mut role = Role::new(&command.name, command.barclamp_id)
            .with_order(command.order.unwrap_or(DEFAULT_ORDER))
            .with_created_by(&ctx.principal_id);
        role.states = command.states.clone();
        role.description = command.description.clone();

        let event = RoleCreated::new(&ctx, &role);

        // Atomic commit; the unique index still guards a lost race
        self.unit_of_work.commit(&role, event, &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::Database;
    use crate::usecase::InMemoryUnitOfWork;
    use proptest::prelude::*;

    fn command(name: &str, barclamp_id: i64) -> CreateRoleCommand {
        CreateRoleCommand {
            name: name.to_string(),
            states: None,
            order: None,
            description: None,
            barclamp_id: BarclampId(barclamp_id),
        }
    }

    async fn use_case() -> (CreateRoleUseCase<InMemoryUnitOfWork>, Arc<InMemoryUnitOfWork>) {
        let db = Database::in_memory().await.unwrap();
        let uow = Arc::new(InMemoryUnitOfWork::new());
        (
            CreateRoleUseCase::new(Arc::new(RoleRepository::new(&db)), uow.clone()),
            uow,
        )
    }

    #[test]
    fn test_command_accepts_priority_alias() {
        let cmd: CreateRoleCommand =
            serde_json::from_str(r#"{"name":"compute","priority":5,"barclampId":1}"#).unwrap();
        assert_eq!(cmd.order, Some(5));
        assert_eq!(cmd.barclamp_id, BarclampId(1));

        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""order":5"#));
    }

    #[tokio::test]
    async fn test_create_success() {
        let (use_case, uow) = use_case().await;
        let mut cmd = command("compute", 1);
        cmd.order = Some(5);
        cmd.states = Some("ready".to_string());

        let event = use_case
            .execute(cmd, ExecutionContext::create("admin"))
            .await
            .unwrap();

        assert_eq!(event.name, "compute");
        assert_eq!(event.order, 5);
        assert_eq!(event.states.as_deref(), Some("ready"));
        assert_eq!(uow.event_count(), 1);
    }

    #[tokio::test]
    async fn test_create_defaults_order() {
        let (use_case, _uow) = use_case().await;
        let event = use_case
            .execute(command("compute", 1), ExecutionContext::create("admin"))
            .await
            .unwrap();
        assert_eq!(event.order, DEFAULT_ORDER);
    }

    #[tokio::test]
    async fn test_create_invalid_name() {
        let (use_case, uow) = use_case().await;
        let result = use_case
            .execute(command("9compute", 1), ExecutionContext::create("admin"))
            .await;

        assert_eq!(result.error().map(|e| e.code()), Some("INVALID_FORMAT"));
        assert_eq!(uow.event_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_priority_and_order_keys_parse_alike(n in any::<i32>()) {
            let by_priority: CreateRoleCommand = serde_json::from_value(
                serde_json::json!({ "name": "compute", "priority": n, "barclampId": 1 }),
            )
            .unwrap();
            let by_order: CreateRoleCommand = serde_json::from_value(
                serde_json::json!({ "name": "compute", "order": n, "barclampId": 1 }),
            )
            .unwrap();

            prop_assert_eq!(by_priority.order, Some(n));
            prop_assert_eq!(by_order.order, Some(n));
        }
    }
}
