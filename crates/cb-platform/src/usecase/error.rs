//! Use Case Errors
//!
//! Categorized error types for use case failures. The category decides how
//! a caller should present the failure (see [`UseCaseError::http_status_code`]).
//!
//! ```ignore
//! use cb_platform::details;
//! use cb_platform::usecase::UseCaseError;
//!
//! UseCaseError::validation("ROLE_ID_REQUIRED", "Role ID is required");
//!
//! UseCaseError::business_rule_with_details(
//!     "DUPLICATE_NAME",
//!     "Name item must be unique",
//!     details! { "name" => name, "barclampId" => barclamp_id },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Build an error detail map from `key => value` pairs.
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

/// Categorized error types for use case failures.
///
/// - `ValidationError` -> 400 Bad Request
/// - `BusinessRuleViolation` -> 409 Conflict
/// - `NotFoundError` -> 404 Not Found
/// - `ConcurrencyError` -> 409 Conflict
/// - `CommitError` -> 500 Internal Server Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    /// Input failed validation (missing field, bad name format, ...)
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// A domain constraint was violated (duplicate name, ...)
    BusinessRuleViolation {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    NotFoundError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// The store rejected a write that raced another transaction.
    ConcurrencyError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Transaction could not be committed.
    CommitError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation_with_details(code, message, HashMap::new())
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn business_rule(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::business_rule_with_details(code, message, HashMap::new())
    }

    pub fn business_rule_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn concurrency(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConcurrencyError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::CommitError {
            code: "COMMIT_FAILED".to_string(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. }
            | Self::BusinessRuleViolation { code, .. }
            | Self::NotFoundError { code, .. }
            | Self::ConcurrencyError { code, .. }
            | Self::CommitError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. }
            | Self::BusinessRuleViolation { message, .. }
            | Self::NotFoundError { message, .. }
            | Self::ConcurrencyError { message, .. }
            | Self::CommitError { message, .. } => message,
        }
    }

    pub fn details(&self) -> &HashMap<String, serde_json::Value> {
        match self {
            Self::ValidationError { details, .. }
            | Self::BusinessRuleViolation { details, .. }
            | Self::NotFoundError { details, .. }
            | Self::ConcurrencyError { details, .. }
            | Self::CommitError { details, .. } => details,
        }
    }

    /// Suggested HTTP status for an enclosing web layer.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } => 400,
            Self::BusinessRuleViolation { .. } => 409,
            Self::NotFoundError { .. } => 404,
            Self::ConcurrencyError { .. } => 409,
            Self::CommitError { .. } => 500,
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}
