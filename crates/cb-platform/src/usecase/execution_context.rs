//! Execution Context
//!
//! Tracing ids and the acting principal, carried through one use case
//! execution and copied into every event it produces.

use chrono::{DateTime, Utc};

use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution
    pub execution_id: String,
    /// Distributed tracing ID, usually taken from the originating request
    pub correlation_id: String,
    /// Event that triggered this execution, if any
    pub causation_id: Option<String>,
    /// Who is performing the action
    pub principal_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Context for a fresh request; correlation starts as the execution id.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }
}
