//! Event Store
//!
//! Domain events committed by the unit of work, one row per mutation.

pub mod entity;
pub mod repository;

pub use entity::{Event, CLOUDEVENTS_SPEC_VERSION};
pub use repository::EventRepository;
