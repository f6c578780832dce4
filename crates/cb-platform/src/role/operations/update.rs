//! Update Role Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::RoleUpdated;
use crate::role::entity::{validate_name, BarclampId, RoleValidationError};
use crate::role::repository::RoleRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Command for updating an existing role. Absent fields are left alone, so
/// `states` and `description` can be blanked but not cleared to null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleCommand {
    pub role_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,

    #[serde(default, alias = "priority", skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barclamp_id: Option<BarclampId>,
}

impl UpdateRoleCommand {
    pub fn new(role_id: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            name: None,
            states: None,
            order: None,
            description: None,
            barclamp_id: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.states.is_none()
            && self.order.is_none()
            && self.description.is_none()
            && self.barclamp_id.is_none()
    }
}

/// Use case for updating an existing role.
pub struct UpdateRoleUseCase<U: UnitOfWork> {
    role_repo: Arc<RoleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UpdateRoleUseCase<U> {
    pub fn new(role_repo: Arc<RoleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            role_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: UpdateRoleCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<RoleUpdated> {
        if command.role_id.trim().is_empty() {
            return UseCaseResult::failure(UseCaseError::validation(
                "ROLE_ID_REQUIRED",
                "Role ID is required",
            ));
        }

        if command.is_empty() {
            return UseCaseResult::failure(UseCaseError::validation(
                "NO_UPDATES",
                "At least one field must be provided for update",
            ));
        }

        let mut role = match self.role_repo.find_by_id(&command.role_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                return UseCaseResult::failure(UseCaseError::not_found(
                    "ROLE_NOT_FOUND",
                    format!("Role with ID '{}' not found", command.role_id),
                ));
            }
            Err(e) => {
                return UseCaseResult::failure(UseCaseError::commit(format!(
                    "Failed to fetch role: {}",
                    e
                )));
            }
        };

        let mut event = RoleUpdated::new(&ctx, &role.id);

        if let Some(ref name) = command.name {
            if *name != role.name {
                role.name = name.clone();
                event.name = Some(name.clone());
            }
        }

        if let Some(ref states) = command.states {
            if role.states.as_deref() != Some(states.as_str()) {
                role.states = Some(states.clone());
                event.states = Some(states.clone());
            }
        }

        if let Some(order) = command.order {
            if order != role.order {
                role.set_order(order);
                event.order = Some(order);
            }
        }

        if let Some(ref desc) = command.description {
            if role.description.as_deref() != Some(desc.as_str()) {
                role.description = Some(desc.clone());
                event.description = Some(desc.clone());
            }
        }

        if let Some(barclamp_id) = command.barclamp_id {
            if barclamp_id != role.barclamp_id {
                role.barclamp_id = barclamp_id;
                event.barclamp_id = Some(barclamp_id);
            }
        }

        if !event.has_changes() {
            return UseCaseResult::failure(UseCaseError::validation(
                "NO_CHANGES",
                "No changes detected",
            ));
        }

        // Name and barclamp together form the uniqueness scope
        if event.name.is_some() || event.barclamp_id.is_some() {
            if let Err(e) = validate_name(&role.name) {
                return UseCaseResult::failure(e.into());
            }

            match self
                .role_repo
                .exists_by_name(role.barclamp_id, &role.name, Some(&role.id))
                .await
            {
                Ok(false) => {}
                Ok(true) => {
                    return UseCaseResult::failure(
                        RoleValidationError::DuplicateName {
                            name: role.name.clone(),
                            barclamp_id: role.barclamp_id,
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
        }

        role.touch();

        self.unit_of_work.commit_update(&role, event, &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::entity::Role;
    use crate::shared::database::Database;
    use crate::usecase::{Aggregate, InMemoryUnitOfWork};

    async fn setup() -> (UpdateRoleUseCase<InMemoryUnitOfWork>, Role) {
        let db = Database::in_memory().await.unwrap();
        let role = Role::new("compute", BarclampId(1)).with_description("Compute");
        let mut conn = db.pool().acquire().await.unwrap();
        role.insert(&mut *conn).await.unwrap();
        drop(conn);

        let use_case = UpdateRoleUseCase::new(
            Arc::new(RoleRepository::new(&db)),
            Arc::new(InMemoryUnitOfWork::new()),
        );
        (use_case, role)
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::create("admin")
    }

    #[tokio::test]
    async fn test_requires_role_id() {
        let (use_case, _role) = setup().await;
        let result = use_case.execute(UpdateRoleCommand::new(" "), ctx()).await;
        assert_eq!(result.error().map(|e| e.code()), Some("ROLE_ID_REQUIRED"));
    }

    #[tokio::test]
    async fn test_no_updates() {
        let (use_case, role) = setup().await;
        let result = use_case.execute(UpdateRoleCommand::new(&role.id), ctx()).await;
        assert_eq!(result.error().map(|e| e.code()), Some("NO_UPDATES"));
    }

    #[tokio::test]
    async fn test_no_changes() {
        let (use_case, role) = setup().await;
        let mut cmd = UpdateRoleCommand::new(&role.id);
        cmd.name = Some("compute".to_string());
        cmd.description = Some("Compute".to_string());

        let result = use_case.execute(cmd, ctx()).await;
        assert_eq!(result.error().map(|e| e.code()), Some("NO_CHANGES"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let (use_case, _role) = setup().await;
        let mut cmd = UpdateRoleCommand::new("missing");
        cmd.order = Some(1);

        let result = use_case.execute(cmd, ctx()).await;
        assert_eq!(result.error().map(|e| e.code()), Some("ROLE_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_invalid_rename() {
        let (use_case, role) = setup().await;
        let mut cmd = UpdateRoleCommand::new(&role.id);
        cmd.name = Some("bad name".to_string());

        let result = use_case.execute(cmd, ctx()).await;
        assert_eq!(result.error().map(|e| e.code()), Some("INVALID_FORMAT"));
    }

    #[tokio::test]
    async fn test_priority_update_reports_order() {
        let (use_case, role) = setup().await;
        let cmd: UpdateRoleCommand =
            serde_json::from_value(serde_json::json!({ "roleId": role.id, "priority": 5 })).unwrap();

        let event = use_case.execute(cmd, ctx()).await.unwrap();
        assert_eq!(event.order, Some(5));
        assert!(event.name.is_none());
    }
}
