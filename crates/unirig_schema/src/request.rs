//! Validated, defaulted requests.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use unirig_core::Timestamp;

/// Request that passed its schema
///
/// Every declared field is present: supplied values, resolved defaults, or
/// `null` for optional fields without a default. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRequest {
    schema: &'static str,
    received_at: Timestamp,
    values: IndexMap<String, Value>,
}

impl ValidatedRequest {
    pub(crate) fn new(
        schema: &'static str,
        received_at: Timestamp,
        values: IndexMap<String, Value>,
    ) -> Self {
        Self {
            schema,
            received_at,
            values,
        }
    }

    /// Schema that validated this request
    #[must_use]
    pub fn schema(&self) -> &'static str {
        self.schema
    }

    /// Instant time-derived defaults were computed from
    #[must_use]
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    /// Raw value of a field (`None` only for undeclared names)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of a field
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Integer value of a field
    #[must_use]
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// Boolean value of a field
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    /// Whether a field carries a non-null value
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Normalized record as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
