//! Validation errors and how they are shown.

use std::fmt;
use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use conl_tokenizer::DecodeError;

use crate::pattern::join_with_or;

fn ariadne_config() -> Config {
    let config = Config::default().with_index_type(IndexType::Byte);
    let no_color = std::env::var("NO_COLOR").is_ok();
    if no_color {
        config.with_color(false)
    } else {
        config
    }
}

/// Which half of an entry a [`Position`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    /// The key, or the `=` marker of a list item.
    Key,
    /// The value.
    Value,
}

/// Where in a document an error or an attempted match belongs.
///
/// Line 0 is the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-based line of the entry, or 0 for the root.
    pub line: usize,
    /// Whether the key or the value is meant.
    pub side: Side,
}

impl Position {
    /// The document root.
    pub const ROOT: Position = Position {
        line: 0,
        side: Side::Value,
    };

    /// The key of the entry on `line`.
    pub fn key(line: usize) -> Self {
        Position {
            line,
            side: Side::Key,
        }
    }

    /// The value of the entry on `line`.
    pub fn value(line: usize) -> Self {
        Position {
            line,
            side: Side::Value,
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The document text could not be read.
    Decode(DecodeError),
    /// The document's schema could not be loaded.
    SchemaLoad(String),
    /// A value did not match; lists what would have.
    ExpectedMatch(Vec<String>),
    /// Required keys that are absent.
    MissingRequiredKey(Vec<String>),
    /// The first required list item that is absent.
    MissingRequiredItem(String),
    /// A key or list item the schema does not allow, e.g. `key password`.
    Unexpected(String),
    /// A key given twice, or two keys matching the same required key.
    DuplicateKey(String),
}

impl ValidationErrorKind {
    /// When several errors land on one position only the highest priority
    /// ones are shown.
    pub(crate) fn priority(&self) -> u8 {
        match self {
            ValidationErrorKind::Decode(_) | ValidationErrorKind::SchemaLoad(_) => 4,
            ValidationErrorKind::DuplicateKey(_) | ValidationErrorKind::Unexpected(_) => 3,
            ValidationErrorKind::MissingRequiredKey(_)
            | ValidationErrorKind::MissingRequiredItem(_) => 2,
            ValidationErrorKind::ExpectedMatch(_) => 1,
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::Decode(error) => write!(f, "{}", error),
            ValidationErrorKind::SchemaLoad(message) => write!(f, "{}", message),
            ValidationErrorKind::ExpectedMatch(expected) => {
                write!(f, "expected {}", join_with_or(expected))
            }
            ValidationErrorKind::MissingRequiredKey(keys) => {
                write!(f, "missing required key {}", join_with_or(keys))
            }
            ValidationErrorKind::MissingRequiredItem(item) => {
                write!(f, "missing required list item {}", item)
            }
            ValidationErrorKind::Unexpected(what) => write!(f, "unexpected {}", what),
            ValidationErrorKind::DuplicateKey(key) => write!(f, "duplicate key {}", key),
        }
    }
}

/// A problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Where the error belongs.
    pub position: Position,
    /// What went wrong.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Create a validation error.
    pub fn new(position: Position, kind: ValidationErrorKind) -> Self {
        ValidationError { position, kind }
    }

    /// The 1-based line to report. Errors on the root are reported on line 1.
    pub fn line(&self) -> usize {
        self.position.line.max(1)
    }

    /// Whether the error is about a key rather than a value.
    pub fn is_key(&self) -> bool {
        self.position.side == Side::Key
    }

    /// The message without the line number.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// The byte range within `line_text` (the text of [`line`](Self::line))
    /// that the error is about.
    ///
    /// ```
    /// use conl_schema::{Position, ValidationError, ValidationErrorKind};
    ///
    /// let error = ValidationError::new(
    ///     Position::value(1),
    ///     ValidationErrorKind::ExpectedMatch(vec!["true".into()]),
    /// );
    /// assert_eq!(error.byte_range("  enabled = yes ; comment"), 12..15);
    /// ```
    pub fn byte_range(&self, line_text: &str) -> Range<usize> {
        let parts = split_line(line_text);
        if self.position.line == 0 {
            parts.key.start..parts.value.end.max(parts.key.end)
        } else if self.is_key() || parts.value.is_empty() {
            parts.key
        } else {
            parts.value
        }
    }

    /// Render this error with ariadne.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let range = self.source_range(source);
        let label = if self.is_key() { "this key" } else { "this value" };
        let _ = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.message())
            .with_label(
                Label::new((filename, range))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .with_config(ariadne_config())
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    /// The error's byte range within the whole source.
    fn source_range(&self, source: &str) -> Range<usize> {
        let mut offset = 0;
        for (index, text) in source.split_inclusive('\n').enumerate() {
            if index + 1 == self.line() {
                let text = text.trim_end_matches(['\n', '\r']);
                let range = self.byte_range(text);
                return offset + range.start..offset + range.end;
            }
            offset += text.len();
        }
        source.len()..source.len()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line(), self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Byte ranges of the parts of one line of a document.
#[derive(Debug, PartialEq, Eq)]
struct LineParts {
    key: Range<usize>,
    value: Range<usize>,
    comment: Option<usize>,
}

/// Split a line into key, value and comment. Separators inside quoted
/// literals are ignored.
fn split_line(line: &str) -> LineParts {
    let bytes = line.as_bytes();
    let skip_blank = |mut i: usize| {
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        i
    };
    let trim_back = |start: usize, mut end: usize| {
        while end > start && matches!(bytes[end - 1], b' ' | b'\t') {
            end -= 1;
        }
        end
    };

    let start = skip_blank(0);
    let (key, after_key) = if bytes.get(start) == Some(&b'=') {
        (start..start + 1, start + 1)
    } else {
        let (end, stop) = scan(bytes, start, true);
        let key = start..trim_back(start, end);
        match stop {
            Some(b'=') => (key, end + 1),
            stop => {
                let at = key.end;
                return LineParts {
                    key,
                    value: at..at,
                    comment: stop.map(|_| end),
                };
            }
        }
    };

    let value_start = skip_blank(after_key);
    let (end, stop) = scan(bytes, value_start, false);
    LineParts {
        key,
        value: value_start..trim_back(value_start, end),
        comment: stop.map(|_| end),
    }
}

/// Find the first unquoted `;` (and `=` when `in_key`), returning its index
/// and the byte found, or the end of the line.
fn scan(bytes: &[u8], from: usize, in_key: bool) -> (usize, Option<u8>) {
    let mut quoted = false;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quoted => i += 1,
            b'"' => quoted = !quoted,
            b';' if !quoted => return (i, Some(b';')),
            b'=' if in_key && !quoted => return (i, Some(b'=')),
            _ => {}
        }
        i += 1;
    }
    (bytes.len(), None)
}
