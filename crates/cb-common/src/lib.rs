//! Crowbar Common
//!
//! Infrastructure shared by every Crowbar crate and binary.

pub mod logging;

pub use logging::{init_logging, LogFormat};
