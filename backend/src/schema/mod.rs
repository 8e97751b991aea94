//! Entity schemas: the single untyped → typed choke point.
//!
//! Each schema turns one loosely typed spreadsheet record into a canonical
//! entity from [`crate::models`], or fails with a
//! [`SchemaValidationError`] listing every structural problem in the record.
//!
//! Schemas only check structure: presence, type coercion, ranges and date
//! format. Whether fields agree with each other (totals, balances) is left to
//! [`crate::validation::consistency`], which reports warnings instead.
//!
//! Field names are looked up by their canonical camelCase key first and then
//! by the Spanish column names used by the original spreadsheet export.

pub mod bank;
pub mod client;
pub mod purchase_order;
pub mod sale;
pub mod warehouse;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{FieldError, SchemaResult, SchemaValidationError};
use crate::models::EntityKind;

pub use bank::parse_bank;
pub use client::parse_client;
pub use purchase_order::parse_purchase_order;
pub use sale::parse_sale;
pub use warehouse::parse_warehouse;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// A raw record as produced by the spreadsheet-to-JSON step.
pub type RawRecord = Map<String, Value>;

/// A per-entity parse function.
pub trait Schema: Sized {
    /// Kind reported in issue records.
    const KIND: EntityKind;

    /// Parse a raw record into the canonical entity.
    fn parse(raw: &Value) -> SchemaResult<Self>;
}

// =============================================================================
// Field descriptors
// =============================================================================

/// A field name with the alternative column names it may arrive under.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Field {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }
}

/// Identifier of a raw record, for error reporting before it parsed.
pub fn raw_id(raw: &Value) -> Option<String> {
    match raw.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Record reader
// =============================================================================

/// Reads typed fields out of a raw record, collecting problems as it goes.
///
/// Accessors return a placeholder on failure so a schema can read every
/// field and report all problems at once; [`RecordReader::finish`] fails if
/// any were recorded, so placeholders never leave the schema.
pub struct RecordReader<'a> {
    map: &'a RawRecord,
    problems: Vec<FieldError>,
}

impl<'a> RecordReader<'a> {
    /// Reader over a raw value that must be a JSON object.
    pub fn new(raw: &'a Value) -> SchemaResult<Self> {
        match raw {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(SchemaValidationError::not_an_object(type_name(other))),
        }
    }

    pub fn from_map(map: &'a RawRecord) -> Self {
        Self {
            map,
            problems: Vec::new(),
        }
    }

    /// First non-null value under the field name or one of its aliases.
    pub fn raw(&self, field: &Field) -> Option<&'a Value> {
        std::iter::once(field.name)
            .chain(field.aliases.iter().copied())
            .filter_map(|key| self.map.get(key))
            .find(|v| !v.is_null())
    }

    /// Whether the field holds a non-blank value.
    pub fn is_present(&self, field: &Field) -> bool {
        self.raw(field).is_some_and(|v| !is_blank(v))
    }

    /// Record a problem found by the schema itself.
    pub fn push(&mut self, problem: FieldError) {
        self.problems.push(problem);
    }

    pub fn required_string(&mut self, field: &Field) -> String {
        match self.optional_string(field) {
            Some(s) => s,
            None => {
                if !self.has_problem(field) {
                    self.push(missing(field));
                }
                String::new()
            }
        }
    }

    /// Trimmed string; numbers are accepted and printed. Blank → `None`.
    pub fn optional_string(&mut self, field: &Field) -> Option<String> {
        match self.raw(field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.push(wrong_type(field, "string", other));
                None
            }
        }
    }

    pub fn required_number(&mut self, field: &Field) -> f64 {
        match self.optional_number(field) {
            Some(n) => n,
            None => {
                if !self.has_problem(field) {
                    self.push(missing(field));
                }
                0.0
            }
        }
    }

    /// Number from a JSON number or a numeric string. Blank → `None`.
    pub fn optional_number(&mut self, field: &Field) -> Option<f64> {
        let value = self.raw(field)?;
        if is_blank(value) {
            return None;
        }
        match coerce_number(value) {
            Some(n) => Some(n),
            None => {
                self.push(wrong_type(field, "number", value));
                None
            }
        }
    }

    /// Required number that must be >= 0.
    pub fn required_amount(&mut self, field: &Field) -> f64 {
        let value = self.required_number(field);
        self.non_negative(field, value)
    }

    /// Optional number that must be >= 0 when present.
    pub fn optional_amount(&mut self, field: &Field) -> Option<f64> {
        self.optional_number(field).map(|v| self.non_negative(field, v))
    }

    /// Optional `YYYY-MM-DD` date.
    pub fn optional_date(&mut self, field: &Field) -> Option<String> {
        let date = self.optional_string(field)?;
        let valid = DATE_RE.is_match(&date)
            && chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok();
        if valid {
            Some(date)
        } else {
            self.push(FieldError::BadFormat {
                field: field.name.to_string(),
                expected: "YYYY-MM-DD",
                value: date,
            });
            None
        }
    }

    /// Array field; absent means empty.
    pub fn array(&mut self, field: &Field) -> &'a [Value] {
        match self.raw(field) {
            None => &[],
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.push(wrong_type(field, "array", other));
                &[]
            }
        }
    }

    /// Fail with every problem recorded so far.
    pub fn finish(self) -> SchemaResult<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::new(self.problems))
        }
    }

    fn non_negative(&mut self, field: &Field, value: f64) -> f64 {
        if value < 0.0 {
            self.push(FieldError::OutOfRange {
                field: field.name.to_string(),
                min: 0.0,
                value,
            });
        }
        value
    }

    fn has_problem(&self, field: &Field) -> bool {
        self.problems.iter().any(|p| p.field() == field.name)
    }
}

/// Coerce a spreadsheet cell to a number.
///
/// Numeric strings may carry surrounding spaces, a `$` sign and thousands
/// separators (`"$1,250.50"`).
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
                .collect();
            crate::normalize::parse_plain_number(&cleaned)
        }
        _ => None,
    }
}

/// Parse every element of an array field with `parse`, prefixing problem
/// paths with `field[index]`.
pub fn parse_nested<T>(
    reader: &mut RecordReader<'_>,
    field: &Field,
    parse: impl Fn(&Value) -> SchemaResult<T>,
) -> Vec<T> {
    let items = reader.array(field);
    let mut parsed = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match parse(item) {
            Ok(value) => parsed.push(value),
            Err(err) => {
                let prefix = format!("{}[{}]", field.name, i);
                for problem in err.problems {
                    reader.push(problem.nested(&prefix));
                }
            }
        }
    }
    parsed
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn missing(field: &Field) -> FieldError {
    FieldError::Missing {
        field: field.name.to_string(),
    }
}

fn wrong_type(field: &Field, expected: &'static str, found: &Value) -> FieldError {
    let found = match found {
        Value::String(s) => format!("string '{}'", s),
        other => type_name(other).to_string(),
    };
    FieldError::WrongType {
        field: field.name.to_string(),
        expected,
        found,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const QTY: Field = Field::new("quantity", &["cantidad"]);
    const NAME: Field = Field::new("name", &["nombre"]);
    const DATE: Field = Field::new("date", &["fecha"]);

    #[test]
    fn test_alias_lookup() {
        let raw = json!({"cantidad": 150, "nombre": "Primo"});
        let mut reader = RecordReader::new(&raw).unwrap();
        assert_eq!(reader.required_number(&QTY), 150.0);
        assert_eq!(reader.required_string(&NAME), "Primo");
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let raw = json!({"quantity": 3, "cantidad": 150});
        let mut reader = RecordReader::new(&raw).unwrap();
        assert_eq!(reader.required_number(&QTY), 3.0);
    }

    #[test]
    fn test_numeric_strings_coerce() {
        assert_eq!(coerce_number(&json!("$1,250.50")), Some(1250.5));
        assert_eq!(coerce_number(&json!(" 42 ")), Some(42.0));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_collects_every_problem() {
        let raw = json!({"quantity": "many", "date": "25/08/2025"});
        let mut reader = RecordReader::new(&raw).unwrap();
        reader.required_number(&QTY);
        reader.required_string(&NAME);
        reader.optional_date(&DATE);
        let err = reader.finish().unwrap_err();
        assert_eq!(err.problems.len(), 3);
        assert!(matches!(err.problems[0], FieldError::WrongType { .. }));
        assert!(matches!(err.problems[1], FieldError::Missing { .. }));
        assert!(matches!(err.problems[2], FieldError::BadFormat { .. }));
    }

    #[test]
    fn test_impossible_date_rejected() {
        let raw = json!({"date": "2025-13-40"});
        let mut reader = RecordReader::new(&raw).unwrap();
        assert_eq!(reader.optional_date(&DATE), None);
        assert!(reader.finish().is_err());
    }

    #[test]
    fn test_negative_amount_out_of_range() {
        let raw = json!({"quantity": -1});
        let mut reader = RecordReader::new(&raw).unwrap();
        reader.required_amount(&QTY);
        let err = reader.finish().unwrap_err();
        assert!(matches!(err.problems[0], FieldError::OutOfRange { .. }));
    }

    #[test]
    fn test_non_object_record() {
        let raw = json!([1, 2]);
        assert!(RecordReader::new(&raw).is_err());
    }

    #[test]
    fn test_raw_id() {
        assert_eq!(raw_id(&json!({"id": "V001"})), Some("V001".into()));
        assert_eq!(raw_id(&json!({"id": 7})), Some("7".into()));
        assert_eq!(raw_id(&json!({"id": ""})), None);
        assert_eq!(raw_id(&json!("V001")), None);
    }
}
