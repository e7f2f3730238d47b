//! The outcome of validating a document, and editor queries against it.

use conl_tree::{Document, Value};

use crate::pattern;
use crate::schema::{MatcherId, MatcherKind, Shape};
use crate::validate::{Attempt, Attempts};
use crate::{Position, Schema, ValidationError};

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    pub docs: Option<String>,
}

impl Suggestion {
    fn new(value: impl Into<String>, docs: Option<&str>) -> Self {
        Suggestion {
            value: value.into(),
            docs: docs.map(str::to_string),
        }
    }
}

/// Errors found in a document, together with what the validator tried at
/// each position so that the document can be queried without validating it
/// again.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    schema: Schema,
    document: Document,
    attempts: Attempts,
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub(crate) fn new(
        schema: Schema,
        document: Document,
        attempts: Attempts,
        errors: Vec<ValidationError>,
    ) -> Self {
        ValidationResult {
            schema,
            document,
            attempts,
            errors,
        }
    }

    /// Check if validation passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in line order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The validated document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The schema the document was validated against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Keys that could be added to the map owned by the entry on `line`
    /// (0 for the document root). Keys already present are left out.
    ///
    /// If a list is allowed there instead, `=` is suggested.
    pub fn suggested_keys(&self, line: usize) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();
        for attempt in self.attempts_at(Position::value(line)) {
            let Attempt::Definition { id, .. } = attempt else {
                continue;
            };
            match &self.schema.definition(*id).shape {
                Shape::Keys { keys, required } => {
                    for (key, value) in required.iter().chain(keys) {
                        let docs = self.matcher_docs(*value);
                        self.literals(*key, docs, &mut suggestions);
                    }
                }
                Shape::Items { .. } => suggestions.push(Suggestion::new("=", None)),
                Shape::Empty | Shape::Scalar(_) | Shape::OneOf(_) => {}
            }
        }

        if let Some(Value::Map(entries)) = self.value_at(line) {
            suggestions.retain(|s| !entries.iter().any(|e| e.key.content == s.value));
        }
        sorted(suggestions)
    }

    /// Values that could be given to the entry on `line`.
    ///
    /// The flag is set when the entry could also hold a map or a list.
    pub fn suggested_values(&self, line: usize) -> (Vec<Suggestion>, bool) {
        let mut suggestions = Vec::new();
        let mut nested = false;
        for attempt in self.attempts_at(Position::value(line)) {
            match attempt {
                Attempt::Matcher { id, .. } => {
                    let matcher = self.schema.matcher(*id);
                    if let MatcherKind::Pattern { raw, .. } = &matcher.kind
                        && let Some(literals) = pattern::literals(raw)
                    {
                        suggestions.extend(
                            literals
                                .into_iter()
                                .map(|value| Suggestion::new(value, matcher.docs.as_deref())),
                        );
                    }
                }
                Attempt::Definition { id, .. } => {
                    nested |= self.schema.definition(*id).shape.is_container();
                }
                Attempt::Key { .. } => {}
            }
        }
        (sorted(suggestions), nested)
    }

    /// Documentation for the key on `line`.
    pub fn docs_for_key(&self, line: usize) -> Option<String> {
        self.attempts_at(Position::key(line))
            .iter()
            .find_map(|attempt| match attempt {
                Attempt::Key { key, value } => self
                    .schema
                    .matcher(*key)
                    .docs
                    .as_deref()
                    .or_else(|| self.matcher_docs(*value)),
                _ => None,
            })
            .map(str::to_string)
    }

    /// Documentation for the value on `line`, from the outermost matcher or
    /// definition that accepted it.
    pub fn docs_for_value(&self, line: usize) -> Option<String> {
        self.attempts_at(Position::value(line))
            .iter()
            .rev()
            .find_map(|attempt| match attempt {
                Attempt::Matcher { id, ok: true } => self.schema.matcher(*id).docs.as_deref(),
                Attempt::Definition { id, ok: true } => {
                    self.schema.definition(*id).docs.as_deref()
                }
                _ => None,
            })
            .map(str::to_string)
    }

    /// Render all errors with ariadne.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| {
            self.errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Write all error reports to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, mut writer: W) {
        for error in &self.errors {
            error.write_report(filename, source, &mut writer);
        }
    }

    fn attempts_at(&self, position: Position) -> &[Attempt] {
        self.attempts
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A matcher's own docs, or those of the definition it refers to.
    fn matcher_docs(&self, id: MatcherId) -> Option<&str> {
        let matcher = self.schema.matcher(id);
        match &matcher.kind {
            MatcherKind::Reference { target, .. } => matcher
                .docs
                .as_deref()
                .or(self.schema.definition(*target).docs.as_deref()),
            MatcherKind::Pattern { .. } => matcher.docs.as_deref(),
        }
    }

    /// The literal strings a matcher accepts as a scalar, following
    /// references into `scalar` and `one of` definitions.
    fn literals(&self, id: MatcherId, docs: Option<&str>, out: &mut Vec<Suggestion>) {
        let matcher = self.schema.matcher(id);
        let docs = matcher.docs.as_deref().or(docs);
        match &matcher.kind {
            MatcherKind::Pattern { raw, .. } => {
                for value in pattern::literals(raw).unwrap_or_default() {
                    out.push(Suggestion::new(value, docs));
                }
            }
            MatcherKind::Reference { target, .. } => match &self.schema.definition(*target).shape {
                Shape::Scalar(m) => self.literals(*m, docs, out),
                Shape::OneOf(alternatives) => {
                    for m in alternatives {
                        self.literals(*m, docs, out);
                    }
                }
                Shape::Empty | Shape::Keys { .. } | Shape::Items { .. } => {}
            },
        }
    }

    /// The value owned by the entry on `line`, or the root for line 0.
    fn value_at(&self, line: usize) -> Option<&Value> {
        fn find(value: &Value, line: usize) -> Option<&Value> {
            value.entries().iter().find_map(|entry| {
                if entry.line() == line {
                    Some(&entry.value)
                } else {
                    find(&entry.value, line)
                }
            })
        }

        if line == 0 {
            Some(&self.document.root)
        } else {
            find(&self.document.root, line)
        }
    }
}

fn sorted(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| a.value.cmp(&b.value));
    suggestions.dedup_by(|a, b| a.value == b.value);
    suggestions
}
