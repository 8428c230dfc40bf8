//! UniRig API Request Schemas
//!
//! Declarative per-endpoint request shapes and the validator that turns a
//! raw JSON body into an immutable, fully defaulted request. Validation is
//! exhaustive: every violated field is reported at once.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod request;
pub mod schema;
pub mod validate;

pub use error::{FieldError, FieldErrorKind, ValidationError};
pub use request::ValidatedRequest;
pub use schema::{DefaultValue, FieldSpec, FieldType, RequestSchema};
pub use validate::SchemaValidator;
