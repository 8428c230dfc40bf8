//! Request schemas for endpoint validation.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use unirig_core::Timestamp;

/// JSON type a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// JSON string
    String,
    /// JSON number without a fractional part
    Integer,
    /// Any JSON number
    Number,
    /// JSON boolean
    Boolean,
}

impl FieldType {
    /// Check whether a JSON value has this type
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    /// JSON type name of a value, for error messages
    #[must_use]
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "number",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Default applied to a missing optional field
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Fixed value
    Static(Value),
    /// `<prefix>_<yyyymmdd_HHMMSS>` from the request's timestamp
    OutputName {
        /// Name prefix
        prefix: &'static str,
    },
}

impl DefaultValue {
    /// Evaluate the default for a request received at `now`
    #[must_use]
    pub fn resolve(&self, now: &Timestamp) -> Value {
        match self {
            Self::Static(v) => v.clone(),
            Self::OutputName { prefix } => Value::String(now.output_name(prefix)),
        }
    }

    /// Human-readable form for endpoint listings
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Static(v) => v.to_string(),
            Self::OutputName { prefix } => format!("{}_<yyyymmdd_HHMMSS>", prefix),
        }
    }
}

/// Declared field of a request
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name
    pub name: &'static str,
    /// Accepted JSON type
    pub field_type: FieldType,
    /// Whether the field must be present
    pub required: bool,
    /// Default for a missing optional field
    pub default: Option<DefaultValue>,
    /// Enumerated allowed values (empty = any)
    pub allowed: Vec<Value>,
    /// Inclusive integer range
    pub range: Option<(i64, i64)>,
    /// Reject empty strings
    pub non_empty: bool,
    /// Pattern a string must match
    pub pattern: Option<Regex>,
    /// One-line description
    pub description: &'static str,
}

impl FieldSpec {
    fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            default: None,
            allowed: Vec::new(),
            range: None,
            non_empty: false,
            pattern: None,
            description: "",
        }
    }

    /// String field
    #[must_use]
    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Integer field
    #[must_use]
    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Number field
    #[must_use]
    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Boolean field
    #[must_use]
    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a fixed default
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Default to a timestamped output name
    #[must_use]
    pub fn with_output_name_default(mut self, prefix: &'static str) -> Self {
        self.default = Some(DefaultValue::OutputName { prefix });
        self
    }

    /// Restrict to an enumerated set
    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict an integer to `min..=max`
    #[must_use]
    pub fn in_range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Reject empty strings
    #[must_use]
    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    /// Require strings to match a pattern
    #[must_use]
    pub fn matching(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set the description
    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Declared shape of one endpoint's request
#[derive(Debug, Clone)]
pub struct RequestSchema {
    /// Schema name, used in error reports
    pub name: &'static str,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
    /// Groups of optional fields of which exactly one must be present
    pub exactly_one_of: Vec<Vec<&'static str>>,
}

impl RequestSchema {
    /// Create a new schema with no fields
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            exactly_one_of: Vec::new(),
        }
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Require exactly one of the named fields
    #[must_use]
    pub fn exactly_one_of(mut self, group: &[&'static str]) -> Self {
        self.exactly_one_of.push(group.to_vec());
        self
    }

    /// Look up a field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if a field is declared
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
