//! Schema validation for CONL documents.
//!
//! A schema is itself a CONL document. It names a `root` matcher and a set
//! of `definitions`, each describing a scalar, a choice between matchers, a
//! map, or a list:
//!
//! ```
//! use conl_schema::Schema;
//!
//! let schema = Schema::parse(br#"
//! root = <config>
//! definitions
//!   config
//!     required keys
//!       name = .+
//!     keys
//!       enabled = <bool>
//!   bool
//!     one of
//!       = true
//!       = false
//! "#).unwrap();
//!
//! let result = schema.validate(b"name = demo\nenabled = maybe");
//! let messages: Vec<String> = result.errors().iter().map(|e| e.to_string()).collect();
//! assert_eq!(messages, vec!["2: expected false or true"]);
//!
//! let (values, _) = result.suggested_values(2);
//! assert_eq!(values.iter().map(|s| s.value.as_str()).collect::<Vec<_>>(), ["false", "true"]);
//! ```
//!
//! Validation never fails outright. Decode errors in the document, values
//! that do not match, and keys that are missing or unexpected are all
//! reported as [`ValidationError`]s, and the [`ValidationResult`] can be
//! queried for completions even when the document is invalid.

mod tracing_macros;

mod error;
mod pattern;
mod result;
mod schema;
mod validate;
mod validation_error;

pub use conl_tokenizer::{DecodeError, quote};
pub use error::SchemaError;
pub use result::{Suggestion, ValidationResult};
pub use schema::{ANY_SCHEMA_SOURCE, META_SCHEMA_SOURCE, Schema};
pub use validation_error::{Position, Side, ValidationError, ValidationErrorKind};

/// Validate a document that chooses its own schema.
///
/// The root map's `schema` key names the schema, and `load` is called with
/// that name (empty when there is none). The loader may return `None` to
/// accept any document. If it fails, its message is reported on the line
/// of the `schema` key and the document is still checked for decode errors.
///
/// An empty document is valid and the loader is not called.
///
/// ```
/// use conl_schema::{Schema, validate_document};
///
/// let result = validate_document(b"schema = strict\nextra = 1", |name| {
///     assert_eq!(name, "strict");
///     Schema::parse(b"root = <root>\ndefinitions\n  root\n    keys\n      schema = .*")
///         .map(Some)
///         .map_err(|e| e.to_string())
/// });
/// assert_eq!(result.errors()[0].to_string(), "2: unexpected key extra");
/// ```
pub fn validate_document<F>(input: &[u8], load: F) -> ValidationResult
where
    F: FnOnce(&str) -> Result<Option<Schema>, String>,
{
    let document = conl_tree::parse(input);
    if document.root.is_empty() {
        return validate::validate(&Schema::any(), document, Vec::new());
    }

    let declaration = document
        .root
        .as_map()
        .and_then(|entries| entries.iter().find(|e| e.key.content == "schema"));
    let name = declaration
        .and_then(|e| e.value.as_str())
        .unwrap_or_default()
        .to_string();
    let line = declaration.map(|e| e.line()).unwrap_or(0);

    match load(&name) {
        Ok(schema) => {
            crate::debug!(schema = %name, "loaded schema");
            let schema = schema.unwrap_or_else(Schema::any);
            validate::validate(&schema, document, Vec::new())
        }
        Err(message) => {
            crate::debug!(schema = %name, %message, "failed to load schema");
            let error = ValidationError::new(
                Position::value(line),
                ValidationErrorKind::SchemaLoad(message),
            );
            validate::validate(&Schema::any(), document, vec![error])
        }
    }
}
