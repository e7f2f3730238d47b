//! Value types for CONL documents.
//!
//! A CONL value is exactly one of:
//! - nothing (`key` on its own, or `=` with no value)
//! - a scalar (`key = value`, or a multiline `"""` value)
//! - a map (an indented section of `key = value` lines)
//! - a list (an indented section of `= value` lines)
//!
//! Keys and scalars keep the token they were read from so that line numbers
//! and decode errors survive into the tree.

use conl_tokenizer::Token;

/// A CONL value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Value {
    /// No value.
    #[default]
    Empty,
    /// A single-line or multiline scalar.
    Scalar(Token<'static>),
    /// Entries keyed by [`TokenKind::MapKey`](conl_tokenizer::TokenKind::MapKey) tokens.
    Map(Vec<Entry>),
    /// Entries keyed by [`TokenKind::ListItem`](conl_tokenizer::TokenKind::ListItem) tokens.
    List(Vec<Entry>),
}

/// An entry in a map or list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Entry {
    /// The map key, or the `=` marker of a list item.
    pub key: Token<'static>,
    /// The text after `"""` for multiline values.
    pub hint: Option<Token<'static>>,
    /// The value.
    pub value: Value,
    /// Line of the entry that owns the enclosing section, 0 at the root.
    pub parent_line: usize,
}

impl Value {
    /// Check if this is no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Get the scalar text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(token) => Some(&token.content),
            _ => None,
        }
    }

    /// Get the scalar token.
    pub fn as_scalar(&self) -> Option<&Token<'static>> {
        match self {
            Value::Scalar(token) => Some(token),
            _ => None,
        }
    }

    /// Get map entries.
    pub fn as_map(&self) -> Option<&[Entry]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get list items.
    pub fn as_list(&self) -> Option<&[Entry]> {
        match self {
            Value::List(entries) => Some(entries),
            _ => None,
        }
    }

    /// Entries of a map or list.
    pub fn entries(&self) -> &[Entry] {
        match self {
            Value::Map(entries) | Value::List(entries) => entries,
            _ => &[],
        }
    }

    /// Get the value of the first map entry with the given key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|e| e.key.content == key)
            .map(|e| &e.value)
    }

    /// Get a list item by index.
    pub fn item(&self, index: usize) -> Option<&Value> {
        self.as_list()?.get(index).map(|e| &e.value)
    }

    /// Line the value starts on, if it has content.
    pub fn line(&self) -> Option<usize> {
        match self {
            Value::Empty => None,
            Value::Scalar(token) => Some(token.line),
            Value::Map(entries) | Value::List(entries) => entries.first().map(|e| e.key.line),
        }
    }

    /// A JSON view of the value.
    ///
    /// Maps become objects (a repeated key keeps its last value), lists
    /// become arrays, scalars become strings and no value becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Empty => serde_json::Value::Null,
            Value::Scalar(token) => serde_json::Value::String(token.content.to_string()),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|e| (e.key.content.to_string(), e.value.to_json()))
                    .collect(),
            ),
            Value::List(entries) => {
                serde_json::Value::Array(entries.iter().map(|e| e.value.to_json()).collect())
            }
        }
    }

    pub(crate) fn visit_tokens<'a>(&'a self, f: &mut impl FnMut(&'a Token<'static>)) {
        match self {
            Value::Empty => {}
            Value::Scalar(token) => f(token),
            Value::Map(entries) | Value::List(entries) => {
                for entry in entries {
                    f(&entry.key);
                    if let Some(hint) = &entry.hint {
                        f(hint);
                    }
                    entry.value.visit_tokens(f);
                }
            }
        }
    }
}

impl Entry {
    /// Line of the key or list marker.
    pub fn line(&self) -> usize {
        self.key.line
    }
}
