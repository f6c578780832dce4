//! Delete Role Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::events::RoleDeleted;
use crate::role::repository::RoleRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// Command for deleting a role together with its element orders and instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoleCommand {
    pub role_id: String,
}

/// Use case for deleting a role.
pub struct DeleteRoleUseCase<U: UnitOfWork> {
    role_repo: Arc<RoleRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> DeleteRoleUseCase<U> {
    pub fn new(role_repo: Arc<RoleRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            role_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: DeleteRoleCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<RoleDeleted> {
        if command.role_id.trim().is_empty() {
            return UseCaseResult::failure(UseCaseError::validation(
                "ROLE_ID_REQUIRED",
                "Role ID is required",
            ));
        }

        let role = match self.role_repo.find_by_id(&command.role_id).await {
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

        info!(role_id = %role.id, name = %role.name, "Deleting role with its children");

        // Children and the role row go in one transaction; the event counts
        // what that transaction actually removed
        self.unit_of_work
            .commit_delete(
                &role,
                |removed| {
                    RoleDeleted::new(
                        &ctx,
                        &role.id,
                        &role.name,
                        removed.element_orders,
                        removed.instances,
                    )
                },
                &command,
            )
            .await
    }
}
