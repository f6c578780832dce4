//! Role Aggregate
//!
//! Role records, their name rules and the use cases that mutate them.

pub mod entity;
pub mod repository;
pub mod operations;

pub use entity::{validate_name, BarclampId, Role, RoleValidationError, DEFAULT_ORDER};
pub use repository::{RoleCascade, RoleRepository};
