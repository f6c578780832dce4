//! Role Entity
//!
//! A named, ordered unit of configuration logic that a barclamp applies to
//! nodes. Names are restricted to identifier characters and are unique
//! within their barclamp, ignoring case.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::details;
use crate::shared::tsid::TsidGenerator;
use crate::usecase::UseCaseError;

/// Order given to roles created without one; sorts them after ordered roles.
pub const DEFAULT_ORDER: i32 = 9999;

/// Identifier of the barclamp that owns a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BarclampId(pub i64);

impl fmt::Display for BarclampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BarclampId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Role record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// TSID as Crockford Base32 string
    pub id: String,

    /// Matches `^[a-zA-Z][_a-zA-Z0-9]*$`
    pub name: String,

    /// Node states this role takes part in, stored as given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,

    /// Execution-order hint, also exposed as `priority`
    pub order: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub barclamp_id: BarclampId,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, barclamp_id: BarclampId) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            name: name.into(),
            states: None,
            order: DEFAULT_ORDER,
            description: None,
            barclamp_id,
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    pub fn with_states(mut self, states: impl Into<String>) -> Self {
        self.states = Some(states.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_priority(self, priority: i32) -> Self {
        self.with_order(priority)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_created_by(mut self, principal_id: impl Into<String>) -> Self {
        self.created_by = Some(principal_id.into());
        self
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
        self.updated_at = Utc::now();
    }

    /// Alias of [`order`](Self::order).
    pub fn priority(&self) -> i32 {
        self.order
    }

    /// Alias of [`set_order`](Self::set_order).
    pub fn set_priority(&mut self, priority: i32) {
        self.set_order(priority);
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check the name format of this role.
    pub fn validate(&self) -> Result<(), RoleValidationError> {
        validate_name(&self.name)
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z][_a-zA-Z0-9]*$").expect("valid role name regex"))
}

/// A role name starts with a letter followed by letters, digits or underscores.
pub fn validate_name(name: &str) -> Result<(), RoleValidationError> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(RoleValidationError::InvalidFormat {
            name: name.to_string(),
        })
    }
}

/// The two ways a role can fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleValidationError {
    #[error("Name limited to [_a-zA-Z0-9]")]
    InvalidFormat { name: String },

    #[error("Name item must be unique")]
    DuplicateName { name: String, barclamp_id: BarclampId },
}

impl RoleValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
        }
    }
}

impl From<RoleValidationError> for UseCaseError {
    fn from(err: RoleValidationError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            RoleValidationError::InvalidFormat { name } => {
                UseCaseError::validation_with_details(code, message, details! { "name" => name })
            }
            RoleValidationError::DuplicateName { name, barclamp_id } => {
                UseCaseError::business_rule_with_details(
                    code,
                    message,
                    details! { "name" => name, "barclampId" => barclamp_id },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_role_defaults() {
        let role = Role::new("compute", BarclampId(1));

        assert_eq!(role.id.len(), 13);
        assert_eq!(role.order, DEFAULT_ORDER);
        assert!(role.states.is_none());
        assert!(role.description.is_none());
        assert_eq!(role.created_at, role.updated_at);
    }

    #[test]
    fn test_priority_aliases_order() {
        let mut role = Role::new("compute", BarclampId(1));

        role.set_priority(5);
        assert_eq!(role.order(), 5);

        role.set_order(7);
        assert_eq!(role.priority(), 7);

        let built = Role::new("network", BarclampId(1)).with_priority(3);
        assert_eq!(built.order, 3);
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "compute", "Compute", "nova_api", "x9", "A_b_C_1"] {
            assert!(validate_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "9compute", "_compute", "nova api", "nova-api", "nova.api", "compute\n", "ñova"] {
            assert_eq!(
                validate_name(name),
                Err(RoleValidationError::InvalidFormat { name: name.to_string() }),
                "{:?} should be invalid",
                name
            );
        }
    }

    #[test]
    fn test_validation_error_mapping() {
        let err: UseCaseError = RoleValidationError::InvalidFormat { name: "9x".into() }.into();
        assert_eq!(err.code(), "INVALID_FORMAT");
        assert_eq!(err.message(), "Name limited to [_a-zA-Z0-9]");
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.details()["name"], "9x");

        let err: UseCaseError = RoleValidationError::DuplicateName {
            name: "Compute".into(),
            barclamp_id: BarclampId(1),
        }
        .into();
        assert_eq!(err.code(), "DUPLICATE_NAME");
        assert_eq!(err.message(), "Name item must be unique");
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.details()["barclampId"], 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let role = Role::new("compute", BarclampId(2)).with_states("ready");
        let json = serde_json::to_value(&role).unwrap();

        assert_eq!(json["barclampId"], 2);
        assert_eq!(json["order"], 9999);
        assert_eq!(json["states"], "ready");
        assert!(json.get("description").is_none());
    }

    fn matches_name_rule(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
            }
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn prop_well_formed_names_are_accepted(name in "[a-zA-Z][_a-zA-Z0-9]{0,30}") {
            prop_assert!(validate_name(&name).is_ok());
        }

        #[test]
        fn prop_leading_digit_or_underscore_is_rejected(
            first in "[0-9_]",
            rest in "[_a-zA-Z0-9]{0,10}"
        ) {
            let name = format!("{}{}", first, rest);
            prop_assert_eq!(
                validate_name(&name),
                Err(RoleValidationError::InvalidFormat { name: name.clone() })
            );
        }

        #[test]
        fn prop_any_forbidden_character_is_rejected(
            name in "[a-zA-Z][_a-zA-Z0-9]{0,10}",
            bad in prop::sample::select(vec![' ', '-', '.', '!', '/', '\n', '\t', 'é', 'ß']),
            at in any::<prop::sample::Index>()
        ) {
            let mut name = name;
            name.insert(at.index(name.len() + 1), bad);
            prop_assert!(validate_name(&name).is_err());
        }

        #[test]
        fn prop_validation_agrees_with_name_rule(name in "\\PC{0,12}") {
            prop_assert_eq!(validate_name(&name).is_ok(), matches_name_rule(&name));
        }

        #[test]
        fn prop_priority_and_order_are_one_field(a in any::<i32>(), b in any::<i32>()) {
            let mut role = Role::new("compute", BarclampId(1)).with_priority(a);
            prop_assert_eq!(role.order(), a);
            prop_assert_eq!(role.priority(), a);

            role.set_order(b);
            prop_assert_eq!(role.priority(), b);

            role.set_priority(a);
            prop_assert_eq!(role.order, a);
        }
    }
}
