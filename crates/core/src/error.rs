//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lifecycle state, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more input fields failed validation.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// The operation is not legal for the entity's current state.
    #[error("invalid state for {entity} {id}: {message}")]
    InvalidState {
        entity: &'static str,
        id: String,
        message: String,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A conflict occurred (e.g. stale version / duplicate creation).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    pub fn invalid_state(
        entity: &'static str,
        id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            entity,
            id: id.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Field violations carried by a validation error (empty for other kinds).
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(v) => v,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = DomainError::Validation(vec![
            FieldViolation::new("name", "is required"),
            FieldViolation::new("poolSize", "must be at least 1"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: name: is required; poolSize: must be at least 1"
        );
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = DomainError::not_found("product", "abc");
        assert_eq!(err.to_string(), "product abc not found");
        assert!(err.violations().is_empty());
    }

    #[test]
    fn invalid_state_carries_context() {
        let err = DomainError::invalid_state("product", 7, "already approved");
        match err {
            DomainError::InvalidState { entity, id, message } => {
                assert_eq!(entity, "product");
                assert_eq!(id, "7");
                assert_eq!(message, "already approved");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
