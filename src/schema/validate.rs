//! Core validation types and the load-once schema store

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use super::schema::{FieldType, Schema, SchemaField};

/// Validation errors carrying enough detail to fix the source file:
/// the violating field path, the violated rule, and the offending value.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("field `{field}` is missing")]
    MissingField { field: String },

    #[error("field `{field}` has wrong type: expected {expected}, got `{value}`")]
    WrongType {
        field: String,
        expected: String,
        value: String,
    },

    #[error("field `{field}` violates rule `{constraint}`: offending value `{value}`")]
    ConstraintViolation {
        field: String,
        constraint: String,
        value: String,
    },

    #[error("expected a JSON object, got `{0}`")]
    NotAnObject(String),

    #[error("schema document unavailable, validation fails closed")]
    SchemaUnavailable,

    #[error("multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validator for dynamic JSON values
pub struct JsonValidator {
    schema: Schema,
}

impl JsonValidator {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Validate a JSON value against the schema. Pure over its inputs.
    pub fn validate_value(&self, value: &Value) -> ValidationResult<()> {
        validate_object(&self.schema, value, "")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_for_log(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > 120 {
        let mut short: String = s.chars().take(120).collect();
        short.push_str("...");
        short
    } else {
        s
    }
}

fn validate_object(schema: &Schema, value: &Value, prefix: &str) -> ValidationResult<()> {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(ValidationError::NotAnObject(truncate_for_log(other))),
    };

    let mut errors = Vec::new();

    for field in &schema.fields {
        let path = format!("{}{}", prefix, field.name);

        let field_value = match map.get(&field.name) {
            Some(v) => v,
            None => {
                if field.required {
                    errors.push(ValidationError::MissingField { field: path });
                }
                continue;
            }
        };

        if let Err(e) = validate_field(field, field_value, &path) {
            errors.push(e);
        }
    }

    collapse(errors)
}

fn validate_field(field: &SchemaField, value: &Value, path: &str) -> ValidationResult<()> {
    let type_valid = match (&field.field_type, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (FieldType::Float, Value::Number(_)) => true,
        (FieldType::Boolean, Value::Bool(_)) => true,
        (FieldType::Array(_), Value::Array(_)) => true,
        (FieldType::Object, Value::Object(_)) => true,
        (FieldType::Custom(_), _) => true,
        _ => false,
    };

    if !type_valid {
        return Err(ValidationError::WrongType {
            field: path.to_string(),
            expected: format!("{:?}", field.field_type),
            value: truncate_for_log(value),
        });
    }

    for constraint in &field.constraints {
        if let Err(_msg) = constraint.validate(value) {
            return Err(ValidationError::ConstraintViolation {
                field: path.to_string(),
                constraint: constraint.describe(),
                value: truncate_for_log(value),
            });
        }
    }

    // Recurse into array elements when an item schema is present
    if let (Some(item_schema), Value::Array(items)) = (&field.item_schema, value) {
        let mut errors = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let item_prefix = format!("{}[{}].", path, idx);
            match item {
                Value::Object(_) => {
                    if let Err(e) = validate_object(item_schema, item, &item_prefix) {
                        errors.push(e);
                    }
                }
                other => errors.push(ValidationError::WrongType {
                    field: format!("{}[{}]", path, idx),
                    expected: "Object".to_string(),
                    value: truncate_for_log(other),
                }),
            }
        }
        return collapse(errors);
    }

    Ok(())
}

fn collapse(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Process-wide schema state with a load-once lifecycle.
///
/// The document is read exactly once at startup. When it cannot be
/// loaded the store enters a disabled state in which every validation
/// fails closed; restoring the document requires a process restart.
pub struct SchemaStore {
    validator: Option<JsonValidator>,
}

impl SchemaStore {
    /// Load the schema document from disk. Failure is logged once,
    /// here, not once per service.
    pub fn load(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))
            .and_then(|content| {
                serde_json::from_str::<Schema>(&content)
                    .map_err(|e| format!("cannot parse {}: {}", path.display(), e))
            });

        match loaded {
            Ok(schema) => {
                log::info!(
                    "Loaded service schema '{}' from {}",
                    schema.name,
                    path.display()
                );
                Self::from_schema(schema)
            }
            Err(reason) => {
                log::error!(
                    "CRITICAL: schema document unavailable ({}). \
                     All services will fail validation until the schema is restored \
                     and the process restarted.",
                    reason
                );
                Self::disabled()
            }
        }
    }

    pub fn from_schema(schema: Schema) -> Self {
        Self {
            validator: Some(JsonValidator::new(schema)),
        }
    }

    pub fn disabled() -> Self {
        Self { validator: None }
    }

    pub fn is_disabled(&self) -> bool {
        self.validator.is_none()
    }

    pub fn validate(&self, value: &Value) -> ValidationResult<()> {
        match &self.validator {
            Some(validator) => validator.validate_value(value),
            None => Err(ValidationError::SchemaUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SchemaStore {
        SchemaStore::from_schema(Schema::service_default())
    }

    #[test]
    fn test_valid_service_passes() {
        let doc = json!({
            "name": "demo",
            "condition": "always_true",
            "actions": [{"type": "mkdir", "path": "/tmp/demo"}]
        });
        assert!(store().validate(&doc).is_ok());
    }

    #[test]
    fn test_condition_is_optional() {
        let doc = json!({
            "name": "demo",
            "actions": [{"type": "notify", "message": "hi"}]
        });
        assert!(store().validate(&doc).is_ok());
    }

    #[test]
    fn test_missing_name_reports_field() {
        let doc = json!({"actions": [{"type": "notify", "message": "hi"}]});
        match store().validate(&doc) {
            Err(ValidationError::MissingField { field }) => assert_eq!(field, "name"),
            other => panic!("expected missing field, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_actions_rejected() {
        let doc = json!({"name": "demo", "actions": []});
        match store().validate(&doc) {
            Err(ValidationError::ConstraintViolation { field, constraint, .. }) => {
                assert_eq!(field, "actions");
                assert!(constraint.contains("minItems"));
            }
            other => panic!("expected constraint violation, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_action_missing_type_has_indexed_path() {
        let doc = json!({
            "name": "demo",
            "actions": [
                {"type": "notify", "message": "ok"},
                {"path": "/tmp"}
            ]
        });
        match store().validate(&doc) {
            Err(ValidationError::MissingField { field }) => assert_eq!(field, "actions[1].type"),
            other => panic!("expected missing field, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_wrong_type_reports_value() {
        let doc = json!({"name": "demo", "condition": 42, "actions": [{"type": "x"}]});
        match store().validate(&doc) {
            Err(ValidationError::WrongType { field, value, .. }) => {
                assert_eq!(field, "condition");
                assert_eq!(value, "42");
            }
            other => panic!("expected wrong type, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_unknown_payload_fields_pass_through() {
        let doc = json!({
            "name": "demo",
            "actions": [{"type": "custom", "anything": {"nested": true}}]
        });
        assert!(store().validate(&doc).is_ok());
    }

    #[test]
    fn test_disabled_store_fails_closed() {
        let doc = json!({
            "name": "demo",
            "actions": [{"type": "notify", "message": "hi"}]
        });
        match SchemaStore::disabled().validate(&doc) {
            Err(ValidationError::SchemaUnavailable) => {}
            other => panic!("expected fail-closed, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_load_missing_file_disables_store() {
        let store = SchemaStore::load(Path::new("/nonexistent/schema.json"));
        assert!(store.is_disabled());
    }
}
