//! Audit Log
//!
//! One row per committed command: who ran it, against which entity, with
//! the full command payload.

pub mod entity;
pub mod repository;

pub use entity::AuditLog;
pub use repository::AuditLogRepository;
