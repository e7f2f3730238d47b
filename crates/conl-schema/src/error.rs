//! Errors from reading a schema.

use std::fmt;

/// Why a schema could not be used.
///
/// Schema errors are fatal: a schema with any of them is rejected by
/// [`Schema::parse`](crate::Schema::parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema text itself is malformed.
    Syntax { line: usize, message: String },
    /// There is no `root` key.
    MissingRoot,
    /// A key the schema format does not know.
    UnexpectedKey { line: usize, key: String },
    /// A key given more than once.
    DuplicateKey { line: usize, key: String },
    /// A key that must be present is missing.
    MissingKey { line: usize, key: &'static str },
    /// A value of the wrong form, e.g. a list where a map is needed.
    Expected { line: usize, expected: &'static str },
    /// A regular expression that does not compile.
    InvalidPattern {
        line: usize,
        pattern: String,
        message: String,
    },
    /// A matcher starting with `<` but not ending with `>`.
    UnclosedReference { line: usize },
    /// A reference to a definition that does not exist.
    Undefined { line: usize, name: String },
    /// A definition that refers back to itself without nesting.
    Cycle { line: usize, name: String },
    /// A definition with more than one of `scalar`, `one of`, keys and items.
    MultipleShapes { line: usize, name: String },
    /// Two definitions with the same name.
    DuplicateDefinition { line: usize, name: String },
}

impl SchemaError {
    /// The 1-based line the error was found on, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            SchemaError::MissingRoot => None,
            SchemaError::Syntax { line, .. }
            | SchemaError::UnexpectedKey { line, .. }
            | SchemaError::DuplicateKey { line, .. }
            | SchemaError::MissingKey { line, .. }
            | SchemaError::Expected { line, .. }
            | SchemaError::InvalidPattern { line, .. }
            | SchemaError::UnclosedReference { line }
            | SchemaError::Undefined { line, .. }
            | SchemaError::Cycle { line, .. }
            | SchemaError::MultipleShapes { line, .. }
            | SchemaError::DuplicateDefinition { line, .. } => Some(*line),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line() {
            write!(f, "{}: ", line)?;
        }
        match self {
            SchemaError::Syntax { message, .. } => write!(f, "{}", message),
            SchemaError::MissingRoot => write!(f, "invalid schema: missing \"root\""),
            SchemaError::UnexpectedKey { key, .. } => write!(f, "unexpected key {}", key),
            SchemaError::DuplicateKey { key, .. } => write!(f, "duplicate key {}", key),
            SchemaError::MissingKey { key, .. } => write!(f, "missing required key {}", key),
            SchemaError::Expected { expected, .. } => write!(f, "expected {}", expected),
            SchemaError::InvalidPattern {
                pattern, message, ..
            } => write!(f, "invalid pattern {}: {}", pattern, message),
            SchemaError::UnclosedReference { .. } => write!(f, "missing closing >"),
            SchemaError::Undefined { name, .. } => write!(f, "<{}> is not defined", name),
            SchemaError::Cycle { name, .. } => {
                write!(f, "<{}> is defined in terms of itself", name)
            }
            SchemaError::MultipleShapes { name, .. } => write!(
                f,
                "{} must have only one of scalar, one of, (required) keys, or (required) items",
                name
            ),
            SchemaError::DuplicateDefinition { name, .. } => {
                write!(f, "{} is defined more than once", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}
