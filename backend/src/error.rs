//! Error types for the import validation pipeline.
//!
//! - [`FieldError`] - One structural problem in one field of a raw record
//! - [`SchemaValidationError`] - Every problem found while parsing one record
//! - [`ImportError`] - Payload loading errors (I/O, JSON, wrong shape)
//! - [`ConfigError`] - Invalid configuration overrides
//! - [`ServerError`] - HTTP surface errors
//!
//! Schema failures never escape `validate_all`: the Layer-1 validator turns
//! them into `ERROR` issues. Only the payload boundary and the outer
//! surfaces return these types to callers.

use thiserror::Error;

// =============================================================================
// Schema Errors
// =============================================================================

/// A single structural problem in a raw record field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// Required field absent, null or blank.
    #[error("missing required field '{field}'")]
    Missing { field: String },

    /// Value could not be coerced to the expected type.
    #[error("field '{field}' expected {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// Numeric value below its lower bound.
    #[error("field '{field}' must be >= {min}, got {value}")]
    OutOfRange { field: String, min: f64, value: f64 },

    /// String value not in the expected format.
    #[error("field '{field}' must match {expected}, got '{value}'")]
    BadFormat {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// Value outside a closed vocabulary.
    #[error("field '{field}' has unknown value '{value}' (expected one of: {allowed})")]
    UnknownVariant {
        field: String,
        value: String,
        allowed: &'static str,
    },
}

impl FieldError {
    /// Name (or path, for nested values) of the offending field.
    pub fn field(&self) -> &str {
        match self {
            FieldError::Missing { field }
            | FieldError::WrongType { field, .. }
            | FieldError::OutOfRange { field, .. }
            | FieldError::BadFormat { field, .. }
            | FieldError::UnknownVariant { field, .. } => field,
        }
    }

    /// Prefix the field path, used when a nested record is parsed.
    pub fn nested(self, prefix: &str) -> Self {
        let join = |field: String| format!("{}.{}", prefix, field);
        match self {
            FieldError::Missing { field } => FieldError::Missing { field: join(field) },
            FieldError::WrongType { field, expected, found } => FieldError::WrongType {
                field: join(field),
                expected,
                found,
            },
            FieldError::OutOfRange { field, min, value } => FieldError::OutOfRange {
                field: join(field),
                min,
                value,
            },
            FieldError::BadFormat { field, expected, value } => FieldError::BadFormat {
                field: join(field),
                expected,
                value,
            },
            FieldError::UnknownVariant { field, value, allowed } => FieldError::UnknownVariant {
                field: join(field),
                value,
                allowed,
            },
        }
    }
}

/// A raw record failed its schema.
///
/// Carries every problem found in the record, not just the first one, so
/// the reviewer can fix a spreadsheet row in a single pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", describe(.problems))]
pub struct SchemaValidationError {
    pub problems: Vec<FieldError>,
}

impl SchemaValidationError {
    pub fn new(problems: Vec<FieldError>) -> Self {
        Self { problems }
    }

    /// Record that is not a JSON object at all.
    pub fn not_an_object(found: &str) -> Self {
        Self::new(vec![FieldError::WrongType {
            field: "record".to_string(),
            expected: "object",
            found: found.to_string(),
        }])
    }

    /// One line per problem, used as issue details.
    pub fn details(&self) -> Vec<String> {
        self.problems.iter().map(ToString::to_string).collect()
    }
}

impl From<FieldError> for SchemaValidationError {
    fn from(err: FieldError) -> Self {
        Self::new(vec![err])
    }
}

fn describe(problems: &[FieldError]) -> String {
    match problems {
        [] => "record is invalid".to_string(),
        [one] => one.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

// =============================================================================
// Import Errors
// =============================================================================

/// Errors while loading an import payload.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Payload is not valid JSON, or a top-level key has the wrong shape.
    #[error("Invalid import payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload root is not a JSON object.
    #[error("Import payload must be a JSON object, found {0}")]
    NotAnObject(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors reading configuration overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable present but unparsable.
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Payload error.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Background validation task failed.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema parsing.
pub type SchemaResult<T> = Result<T, SchemaValidationError>;

/// Result type for payload loading.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
