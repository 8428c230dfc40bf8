//! Exhaustive request validation.

use crate::error::{FieldError, FieldErrorKind, ValidationError};
use crate::request::ValidatedRequest;
use crate::schema::{FieldSpec, FieldType, RequestSchema};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use unirig_core::Timestamp;

/// Validator that applies a [`RequestSchema`] to a raw JSON body
///
/// An explicit `null` is treated as an absent field. Defaults are resolved
/// exactly once per call, all from the same `now`.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    /// Report fields the schema does not declare
    reject_unknown_fields: bool,
}

impl SchemaValidator {
    /// Create a validator that rejects unknown fields
    #[must_use]
    pub fn new() -> Self {
        Self {
            reject_unknown_fields: true,
        }
    }

    /// Set whether undeclared fields are errors
    #[must_use]
    pub fn with_reject_unknown_fields(mut self, reject: bool) -> Self {
        self.reject_unknown_fields = reject;
        self
    }

    /// Validate a raw request received at `now`
    ///
    /// # Errors
    ///
    /// Returns every violated constraint
    pub fn validate(
        &self,
        schema: &RequestSchema,
        raw: &Value,
        now: Timestamp,
    ) -> Result<ValidatedRequest, ValidationError> {
        let Some(body) = raw.as_object() else {
            return Err(ValidationError {
                schema: schema.name.to_string(),
                errors: vec![FieldError::new("$", FieldErrorKind::NotAnObject)],
            });
        };

        let mut errors = Vec::new();
        let mut values = IndexMap::with_capacity(schema.fields.len());

        for spec in &schema.fields {
            match present(body, spec.name) {
                None if spec.required => {
                    errors.push(FieldError::new(spec.name, FieldErrorKind::Missing));
                }
                None => {
                    let value = spec
                        .default
                        .as_ref()
                        .map_or(Value::Null, |d| d.resolve(&now));
                    values.insert(spec.name.to_string(), value);
                }
                Some(value) => {
                    let before = errors.len();
                    check_value(spec, value, &mut errors);
                    if errors.len() == before {
                        values.insert(spec.name.to_string(), value.clone());
                    }
                }
            }
        }

        if self.reject_unknown_fields {
            for key in body.keys() {
                if !schema.declares(key) {
                    errors.push(FieldError::new(key.clone(), FieldErrorKind::Unknown));
                }
            }
        }

        for group in &schema.exactly_one_of {
            let found = group.iter().filter(|f| present(body, f).is_some()).count();
            if found != 1 {
                errors.push(FieldError::new(
                    group.join("|"),
                    FieldErrorKind::ExactlyOneOf {
                        fields: group.iter().map(|f| (*f).to_string()).collect(),
                        found,
                    },
                ));
            }
        }

        if errors.is_empty() {
            Ok(ValidatedRequest::new(schema.name, now, values))
        } else {
            tracing::debug!(
                schema = schema.name,
                violations = errors.len(),
                "request failed validation"
            );
            Err(ValidationError {
                schema: schema.name.to_string(),
                errors,
            })
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn present<'a>(body: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    body.get(name).filter(|v| !v.is_null())
}

/// Push every constraint `value` violates
fn check_value(spec: &FieldSpec, value: &Value, errors: &mut Vec<FieldError>) {
    if !spec.field_type.accepts(value) {
        errors.push(FieldError::new(
            spec.name,
            FieldErrorKind::WrongType {
                expected: spec.field_type,
                found: FieldType::name_of(value),
            },
        ));
        return;
    }

    if let Some(s) = value.as_str() {
        if spec.non_empty && s.trim().is_empty() {
            errors.push(FieldError::new(spec.name, FieldErrorKind::Empty));
        } else if let Some(pattern) = &spec.pattern {
            if !pattern.is_match(s) {
                errors.push(FieldError::new(
                    spec.name,
                    FieldErrorKind::PatternMismatch {
                        pattern: pattern.as_str().to_string(),
                    },
                ));
            }
        }
    }

    if let (Some((min, max)), FieldType::Integer) = (spec.range, spec.field_type) {
        // Integers beyond i64 are out of any declarable range
        let n = value.as_i64().unwrap_or(i64::MAX);
        if n < min || n > max {
            errors.push(FieldError::new(
                spec.name,
                FieldErrorKind::OutOfRange { value: n, min, max },
            ));
        }
    }

    if !spec.allowed.is_empty() && !spec.allowed.contains(value) {
        errors.push(FieldError::new(
            spec.name,
            FieldErrorKind::NotAllowed {
                value: value.clone(),
                allowed: spec.allowed.clone(),
            },
        ));
    }
}
