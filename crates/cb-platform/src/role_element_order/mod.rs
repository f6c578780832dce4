//! Role Element Order
//!
//! Execution group of a role relative to the other roles of its barclamp.
//! Owned by a role and removed with it.

pub mod entity;
pub mod repository;

pub use entity::RoleElementOrder;
pub use repository::RoleElementOrderRepository;
