//! Schema-driven validation of untrusted book payloads.
//!
//! Every field is checked for presence, then type, then each of its
//! constraints. Violations are collected across the whole record so a client
//! learns about every problem in one round-trip.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::models::Book;
use super::schema::{Constraint, FieldSpec, FieldType, Schema, BOOK_SCHEMA};

/// Absolute URL with a scheme and a non-empty authority, no whitespace.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s/?#]+(?:[/?#]\S*)?$")
        .expect("URL pattern is a valid regex")
});

/// Name reported when the payload as a whole is unusable.
const RECORD: &str = "book";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    NotAnObject,
    Missing,
    WrongType { expected: FieldType },
    Empty,
    TooShort { min: usize },
    TooLong { max: usize },
    BelowMinimum { min: i64 },
    InFuture { current_year: i64 },
    InvalidUrl,
    /// Key field disagrees with the key the caller addressed
    KeyMismatch { expected: String },
    Unexpected,
}

/// One field failing one constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
}

impl Violation {
    fn new(field: &str, kind: ViolationKind) -> Self {
        Self {
            field: field.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.kind {
            ViolationKind::NotAnObject => write!(f, "{field} must be a JSON object"),
            ViolationKind::Missing => write!(f, "{field} is required"),
            ViolationKind::WrongType { expected } => {
                write!(f, "{field} must be of type {expected}")
            }
            ViolationKind::Empty => write!(f, "{field} must not be empty"),
            ViolationKind::TooShort { min } => {
                write!(f, "{field} must be at least {min} characters long")
            }
            ViolationKind::TooLong { max } => {
                write!(f, "{field} must be at most {max} characters long")
            }
            ViolationKind::BelowMinimum { min } => write!(f, "{field} must be at least {min}"),
            ViolationKind::InFuture { current_year } => {
                write!(f, "{field} must not be later than {current_year}")
            }
            ViolationKind::InvalidUrl => write!(f, "{field} must be a valid absolute URL"),
            ViolationKind::KeyMismatch { expected } => {
                write!(f, "{field} must match the isbn in the request path ('{expected}')")
            }
            ViolationKind::Unexpected => write!(f, "{field} is not an allowed field"),
        }
    }
}

/// Every violation found in one candidate record, in schema-field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s): {}", self.0.len(), self.messages().join("; "))
    }
}

impl std::error::Error for Violations {}

impl Violations {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any violation names `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

/// A field value that passed its type check
#[derive(Debug, Clone, Copy)]
enum Typed<'a> {
    Text(&'a str),
    Integer(i64),
}

#[derive(Debug, Clone, Copy)]
enum YearSource {
    Clock,
    Fixed(i64),
}

/// Validates candidate records against a schema.
///
/// Pure apart from reading the current year, which can be pinned.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    schema: &'static Schema,
    year: YearSource,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Book validator using the UTC wall clock for the current year
    pub fn new() -> Self {
        Self {
            schema: &BOOK_SCHEMA,
            year: YearSource::Clock,
        }
    }

    /// Book validator that treats `year` as the current year
    pub fn at_year(year: i64) -> Self {
        Self {
            schema: &BOOK_SCHEMA,
            year: YearSource::Fixed(year),
        }
    }

    pub fn with_schema(mut self, schema: &'static Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    fn current_year(&self) -> i64 {
        match self.year {
            YearSource::Clock => i64::from(time::OffsetDateTime::now_utc().year()),
            YearSource::Fixed(year) => year,
        }
    }

    /// Validate a record for creation.
    pub fn validate(&self, candidate: &Value) -> Result<Book, Violations> {
        self.run(candidate, None)
    }

    /// Validate a full replacement of the record stored under `isbn`.
    pub fn validate_replacement(&self, isbn: &str, candidate: &Value) -> Result<Book, Violations> {
        self.run(candidate, Some(isbn))
    }

    /// All violations of `candidate`, without building a record.
    pub fn check(&self, candidate: &Value) -> Vec<Violation> {
        self.inspect(candidate, None).1
    }

    fn run(&self, candidate: &Value, expected_key: Option<&str>) -> Result<Book, Violations> {
        let (fields, violations) = self.inspect(candidate, expected_key);
        if !violations.is_empty() {
            return Err(Violations(violations));
        }
        assemble(&fields).map_err(|violation| Violations(vec![violation]))
    }

    fn inspect<'a>(
        &self,
        candidate: &'a Value,
        expected_key: Option<&str>,
    ) -> (HashMap<&'static str, Typed<'a>>, Vec<Violation>) {
        let mut fields = HashMap::new();
        let mut violations = Vec::new();

        let Some(object) = candidate.as_object() else {
            violations.push(Violation::new(RECORD, ViolationKind::NotAnObject));
            return (fields, violations);
        };

        let current_year = self.current_year();

        for spec in self.schema.fields {
            let typed = match object.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        violations.push(Violation::new(spec.name, ViolationKind::Missing));
                    }
                    continue;
                }
                Some(raw) => match type_check(spec, raw) {
                    Some(typed) => typed,
                    None => {
                        violations.push(Violation::new(
                            spec.name,
                            ViolationKind::WrongType { expected: spec.ty },
                        ));
                        continue;
                    }
                },
            };

            for constraint in spec.constraints {
                if let Some(kind) = apply(*constraint, typed, current_year) {
                    violations.push(Violation::new(spec.name, kind));
                }
            }

            if spec.name == self.schema.key {
                if let (Some(expected), Typed::Text(actual)) = (expected_key, typed) {
                    if actual != expected {
                        violations.push(Violation::new(
                            spec.name,
                            ViolationKind::KeyMismatch {
                                expected: expected.to_string(),
                            },
                        ));
                    }
                }
            }

            fields.insert(spec.name, typed);
        }

        if !self.schema.allow_additional {
            violations.extend(
                object
                    .keys()
                    .filter(|key| self.schema.field(key).is_none())
                    .map(|key| Violation::new(key, ViolationKind::Unexpected)),
            );
        }

        (fields, violations)
    }
}

/// Strict: no numeric strings, no fractional numbers, nothing outside `i64`.
fn type_check<'a>(spec: &FieldSpec, raw: &'a Value) -> Option<Typed<'a>> {
    match (spec.ty, raw) {
        (FieldType::String, Value::String(text)) => Some(Typed::Text(text)),
        (FieldType::Integer, Value::Number(number)) => integral(number).map(Typed::Integer),
        _ => None,
    }
}

/// `1.0` is the integer 1, as JSON Schema's `integer` has it.
fn integral(number: &serde_json::Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    // i64::MAX as f64 rounds up to 2^63, so that bound is exclusive.
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
}

fn apply(constraint: Constraint, value: Typed<'_>, current_year: i64) -> Option<ViolationKind> {
    match (constraint, value) {
        (Constraint::Length { min, max }, Typed::Text(text)) => {
            let length = text.chars().count();
            if length < min {
                Some(ViolationKind::TooShort { min })
            } else if length > max {
                Some(ViolationKind::TooLong { max })
            } else {
                None
            }
        }
        (Constraint::NonEmpty, Typed::Text(text)) if text.is_empty() => Some(ViolationKind::Empty),
        (Constraint::Url, Typed::Text(text)) if !URL_PATTERN.is_match(text) => {
            Some(ViolationKind::InvalidUrl)
        }
        (Constraint::Minimum(min), Typed::Integer(n)) if n < min => {
            Some(ViolationKind::BelowMinimum { min })
        }
        (Constraint::NotInFuture, Typed::Integer(year)) if year > current_year => {
            Some(ViolationKind::InFuture { current_year })
        }
        _ => None,
    }
}

fn assemble(fields: &HashMap<&'static str, Typed<'_>>) -> Result<Book, Violation> {
    let text = |name: &'static str| match fields.get(name) {
        Some(Typed::Text(value)) => Ok(value.to_string()),
        _ => Err(Violation::new(name, ViolationKind::Missing)),
    };
    let integer = |name: &'static str| match fields.get(name) {
        Some(Typed::Integer(value)) => Ok(*value),
        _ => Err(Violation::new(name, ViolationKind::Missing)),
    };

    Ok(Book {
        isbn: text("isbn")?,
        amazon_url: text("amazon_url")?,
        author: text("author")?,
        language: text("language")?,
        pages: integer("pages")?,
        publisher: text("publisher")?,
        title: text("title")?,
        year: integer("year")?,
    })
}
