//! Role Instance
//!
//! A role applied to one node. Holds a back-reference to its role and is
//! removed with it.

pub mod entity;
pub mod repository;

pub use entity::RoleInstance;
pub use repository::RoleInstanceRepository;
