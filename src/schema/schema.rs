//! Schema document model and builder

use serde::{Deserialize, Serialize};

use super::constraints::Constraint;

/// Field types a schema can require
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Array(Box<FieldType>),
    Object,
    Custom(String),
}

/// One named field within a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Schema applied to each element of an array-of-objects field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<Box<Schema>>,
}

impl SchemaField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required: false,
            constraints: Vec::new(),
            item_schema: None,
        }
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// A schema document: a named set of field rules.
///
/// Serializable, so the same type describes both the built-in default
/// and the operator-edited document loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// The built-in schema for semantic service definitions.
    ///
    /// `condition` is optional (absent means always-true); `actions`
    /// must be a non-empty array of objects each naming a `type`.
    /// Handler payload fields must be non-empty strings when present,
    /// and unknown payload fields pass through untouched.
    pub fn service_default() -> Schema {
        let action_schema = SchemaBuilder::new("ActionSpec")
            .string_field("type")
                .required(true)
                .min_length(1)
                .and()
            .string_field("path")
                .min_length(1)
                .and()
            .string_field("command")
                .min_length(1)
                .and()
            .string_field("message")
                .min_length(1)
                .and()
            .build();

        SchemaBuilder::new("SemanticService")
            .description("Shape of a declarative semantic service definition")
            .string_field("name")
                .required(true)
                .min_length(1)
                .and()
            .string_field("condition")
                .min_length(1)
                .and()
            .array_field("actions", FieldType::Object)
                .required(true)
                .min_items(1)
                .items(action_schema)
                .and()
            .build()
    }
}

/// Fluent builder for schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            schema: Schema::new(name),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.schema.description = description.to_string();
        self
    }

    pub fn string_field(self, name: &str) -> FieldBuilder {
        FieldBuilder::new(self, name, FieldType::String)
    }

    pub fn integer_field(self, name: &str) -> FieldBuilder {
        FieldBuilder::new(self, name, FieldType::Integer)
    }

    pub fn boolean_field(self, name: &str) -> FieldBuilder {
        FieldBuilder::new(self, name, FieldType::Boolean)
    }

    pub fn object_field(self, name: &str) -> FieldBuilder {
        FieldBuilder::new(self, name, FieldType::Object)
    }

    pub fn array_field(self, name: &str, item_type: FieldType) -> FieldBuilder {
        FieldBuilder::new(self, name, FieldType::Array(Box::new(item_type)))
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

/// Builder for a single field; `and()` returns to the schema builder
pub struct FieldBuilder {
    builder: SchemaBuilder,
    field: SchemaField,
}

impl FieldBuilder {
    fn new(builder: SchemaBuilder, name: &str, field_type: FieldType) -> Self {
        Self {
            builder,
            field: SchemaField::new(name, field_type),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.field.required = required;
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.field.constraints.push(Constraint::MinLength(len));
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.field.constraints.push(Constraint::MaxLength(len));
        self
    }

    pub fn min(mut self, value: i64) -> Self {
        self.field.constraints.push(Constraint::Min(value));
        self
    }

    pub fn max(mut self, value: i64) -> Self {
        self.field.constraints.push(Constraint::Max(value));
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.field.constraints.push(Constraint::Pattern(pattern.to_string()));
        self
    }

    pub fn one_of(mut self, values: Vec<serde_json::Value>) -> Self {
        self.field.constraints.push(Constraint::OneOf(values));
        self
    }

    pub fn min_items(mut self, count: usize) -> Self {
        self.field.constraints.push(Constraint::MinItems(count));
        self
    }

    pub fn items(mut self, schema: Schema) -> Self {
        self.field.item_schema = Some(Box::new(schema));
        self
    }

    pub fn and(mut self) -> SchemaBuilder {
        self.builder.schema.fields.push(self.field);
        self.builder
    }
}
