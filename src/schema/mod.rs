//! Schema validation for semantic service documents
//!
//! A lightweight validation layer for the JSON the runtime consumes:
//! service definitions are checked against a schema document before
//! anything else is allowed to look at them.

pub mod constraints;
pub mod schema;
pub mod validate;

pub use constraints::Constraint;
pub use schema::{FieldType, Schema, SchemaBuilder, SchemaField};
pub use validate::{JsonValidator, SchemaStore, ValidationError, ValidationResult};
