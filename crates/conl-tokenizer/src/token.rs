//! Token types for the CONL lexer.

use std::borrow::Cow;
use std::fmt;

use crate::DecodeError;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum TokenKind {
    /// `; ...`, content excludes the `;`.
    Comment,
    /// The start of a more deeply indented section. Content is the indentation.
    Indent,
    /// The end of an indented section.
    Outdent,
    /// A key in a map section.
    MapKey,
    /// `=` at the start of a line in a list section.
    ListItem,
    /// A single-line value.
    Scalar,
    /// Synthesized when a key or list item has no value.
    NoValue,
    /// The text after `"""`, e.g. the language of the multiline value.
    MultilineHint,
    /// The content of a multiline value, with the common indentation removed.
    MultilineScalar,
}

impl TokenKind {
    /// Whether this token is trivia: it carries no structure or value.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::MultilineHint)
    }

    /// Whether this token introduces an entry in a section.
    pub fn is_entry(&self) -> bool {
        matches!(self, TokenKind::MapKey | TokenKind::ListItem)
    }

    /// Whether this token carries a value for the preceding entry.
    pub fn is_value(&self) -> bool {
        matches!(self, TokenKind::Scalar | TokenKind::MultilineScalar)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Comment => "comment",
            TokenKind::Indent => "indent",
            TokenKind::Outdent => "outdent",
            TokenKind::MapKey => "map key",
            TokenKind::ListItem => "list item",
            TokenKind::Scalar => "scalar",
            TokenKind::NoValue => "no value",
            TokenKind::MultilineHint => "multiline hint",
            TokenKind::MultilineScalar => "multiline scalar",
        };
        f.write_str(name)
    }
}

/// A token with its kind, decoded content and line number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// Decoded content: escapes in quoted literals are already processed.
    pub content: Cow<'src, str>,
    /// The 1-based line the token starts on.
    pub line: usize,
    /// Set when the token could not be decoded.
    pub error: Option<DecodeError>,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, content: impl Into<Cow<'src, str>>, line: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
            error: None,
        }
    }

    /// Create a token with no content, e.g. [`TokenKind::NoValue`].
    pub fn empty(kind: TokenKind, line: usize) -> Self {
        Self::new(kind, "", line)
    }

    /// Create a token that failed to decode.
    pub fn error(
        kind: TokenKind,
        content: impl Into<Cow<'src, str>>,
        line: usize,
        error: DecodeError,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
            error: Some(error),
        }
    }

    /// Detach the token from the source it was read from.
    pub fn into_owned(self) -> Token<'static> {
        Token {
            kind: self.kind,
            content: Cow::Owned(self.content.into_owned()),
            line: self.line,
            error: self.error,
        }
    }
}
