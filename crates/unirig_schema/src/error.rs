//! Validation errors.

use crate::schema::FieldType;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Why a single field was rejected
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Request body is not a JSON object
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// Required field absent or null
    #[error("required field is missing")]
    Missing,

    /// Value has the wrong JSON type
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Declared type
        expected: FieldType,
        /// JSON type received
        found: &'static str,
    },

    /// Value outside the enumerated set
    #[error("value {value} is not one of {}", join_values(.allowed))]
    NotAllowed {
        /// Received value
        value: Value,
        /// Allowed values
        allowed: Vec<Value>,
    },

    /// Integer outside the declared range
    #[error("value {value} is outside {min}..={max}")]
    OutOfRange {
        /// Received value
        value: i64,
        /// Inclusive minimum
        min: i64,
        /// Inclusive maximum
        max: i64,
    },

    /// Empty string where content is required
    #[error("value must not be empty")]
    Empty,

    /// String does not match the declared pattern
    #[error("value does not match pattern {pattern}")]
    PatternMismatch {
        /// Pattern source
        pattern: String,
    },

    /// Field not declared by the schema
    #[error("unknown field")]
    Unknown,

    /// Zero or several members of an exactly-one-of group present
    #[error("exactly one of {} must be set, found {found}", .fields.join(", "))]
    ExactlyOneOf {
        /// Members of the group
        fields: Vec<String>,
        /// How many were present
        found: usize,
    },
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A rejected field
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{field}: {kind}")]
pub struct FieldError {
    /// Field name; `$` for the body itself, `a|b` for a field group
    pub field: String,
    /// Reason
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl FieldError {
    /// Create a new field error
    #[must_use]
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// Request rejected by its schema
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("request for '{schema}' failed validation: {}", summarize(.errors))]
pub struct ValidationError {
    /// Schema that rejected the request
    pub schema: String,
    /// Every violation, in field declaration order
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Names of all rejected fields
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Check whether a field was rejected
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new(
            "skeleton_template",
            FieldErrorKind::NotAllowed {
                value: json!("bipedal"),
                allowed: vec![json!("mixamo"), json!("vroid")],
            },
        );
        assert_eq!(
            err.to_string(),
            r#"skeleton_template: value "bipedal" is not one of "mixamo", "vroid""#
        );
    }

    #[test]
    fn test_field_error_serializes_flat() {
        let err = FieldError::new("mesh_url", FieldErrorKind::Missing);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"field": "mesh_url", "code": "missing"})
        );
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = ValidationError {
            schema: "rig-avatar".to_string(),
            errors: vec![
                FieldError::new("mesh_url", FieldErrorKind::Missing),
                FieldError::new("seed", FieldErrorKind::OutOfRange { value: -1, min: 0, max: 10 }),
            ],
        };
        assert_eq!(err.fields(), vec!["mesh_url", "seed"]);
        assert!(err.has_field("seed"));
        assert!(!err.has_field("output_name"));
        assert!(err.to_string().contains("mesh_url: required field is missing; seed:"));
    }
}
