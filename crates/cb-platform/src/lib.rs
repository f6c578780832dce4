//! Crowbar Platform
//!
//! Role catalog for Crowbar barclamps:
//! - Roles with validated names, unique per barclamp ignoring case
//! - Role element orders and role instances owned by a role
//! - Use Case pattern with guaranteed event and audit logging
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `operations` - Use case operations (where applicable)

// Core aggregates
pub mod role;
pub mod role_element_order;
pub mod role_instance;

// Event and audit storage
pub mod event;
pub mod audit;

// Shared infrastructure
pub mod shared;

// Cross-cutting concerns
pub mod usecase;

// Re-export common types from shared
pub use shared::database::Database;
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export use case infrastructure
pub use usecase::{
    DomainEvent, ExecutionContext, SqliteUnitOfWork, UnitOfWork, UseCaseError, UseCaseResult,
};
// Note: impl_domain_event! and details! are exported at crate root via #[macro_export]

// Re-export main entity types for convenience
pub use audit::AuditLog;
pub use event::Event;
pub use role::{BarclampId, Role, RoleCascade, RoleValidationError, DEFAULT_ORDER};
pub use role_element_order::RoleElementOrder;
pub use role_instance::RoleInstance;

// Re-export repositories
pub use audit::AuditLogRepository;
pub use event::EventRepository;
pub use role::RoleRepository;
pub use role_element_order::RoleElementOrderRepository;
pub use role_instance::RoleInstanceRepository;

// Re-export role use cases
pub use role::operations::{
    CreateRoleCommand, CreateRoleUseCase, DeleteRoleCommand, DeleteRoleUseCase, RoleCreated,
    RoleDeleted, RoleUpdated, UpdateRoleCommand, UpdateRoleUseCase,
};
