//! Declarative field set of a book record.
//!
//! One static definition is shared by create and replace so both enforce
//! exactly the same rules.

use serde_json::{json, Map, Value};

pub const ISBN_MIN_LEN: usize = 10;
pub const ISBN_MAX_LEN: usize = 13;

/// Primitive JSON type a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A predicate over a field value that already has the right type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Character count within `min..=max`
    Length { min: usize, max: usize },
    NonEmpty,
    /// Absolute URL: `scheme://authority[path][?query][#fragment]`
    Url,
    Minimum(i64),
    /// Not later than the current calendar year (UTC)
    NotInFuture,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub constraints: &'static [Constraint],
}

#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
    /// Field whose value identifies the record in the store
    pub key: &'static str,
    /// Fields outside `fields` are ignored when true, rejected when false
    pub allow_additional: bool,
}

const fn required(
    name: &'static str,
    ty: FieldType,
    constraints: &'static [Constraint],
) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: true,
        constraints,
    }
}

/// Book fields in schema order; violations are reported in this order.
pub const BOOK_FIELDS: &[FieldSpec] = &[
    required(
        "isbn",
        FieldType::String,
        &[Constraint::Length {
            min: ISBN_MIN_LEN,
            max: ISBN_MAX_LEN,
        }],
    ),
    required("amazon_url", FieldType::String, &[Constraint::Url]),
    required("author", FieldType::String, &[Constraint::NonEmpty]),
    required("language", FieldType::String, &[Constraint::NonEmpty]),
    required("pages", FieldType::Integer, &[Constraint::Minimum(1)]),
    required("publisher", FieldType::String, &[Constraint::NonEmpty]),
    required("title", FieldType::String, &[Constraint::NonEmpty]),
    required("year", FieldType::Integer, &[Constraint::NotInFuture]),
];

pub static BOOK_SCHEMA: Schema = Schema {
    fields: BOOK_FIELDS,
    key: "isbn",
    allow_additional: true,
};

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// JSON Schema rendering, used for the OpenAPI document.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(field.ty.name()));
            for constraint in field.constraints {
                match constraint {
                    Constraint::Length { min, max } => {
                        property.insert("minLength".to_string(), json!(min));
                        property.insert("maxLength".to_string(), json!(max));
                    }
                    Constraint::NonEmpty => {
                        property.insert("minLength".to_string(), json!(1));
                    }
                    Constraint::Url => {
                        property.insert("format".to_string(), json!("uri"));
                    }
                    Constraint::Minimum(min) => {
                        property.insert("minimum".to_string(), json!(min));
                    }
                    Constraint::NotInFuture => {
                        property.insert(
                            "description".to_string(),
                            json!("Must not be later than the current year"),
                        );
                    }
                }
            }
            properties.insert(field.name.to_string(), Value::Object(property));
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.allow_additional,
        })
    }
}
