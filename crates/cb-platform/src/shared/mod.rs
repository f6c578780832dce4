//! Shared infrastructure: errors, identifiers, database access.

pub mod database;
pub mod error;
pub mod tsid;
