//! Decode errors attached to tokens.

use std::fmt;

/// Why a token could not be decoded.
///
/// These never stop tokenization; the stream continues with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum DecodeError {
    /// The content is not valid UTF-8.
    InvalidUtf8,
    /// A quoted literal has no closing quote.
    UnclosedQuotes,
    /// Something other than a comment follows a closing quote.
    CharactersAfterQuotes,
    /// An escape other than `\n \r \t \" \\` or `\{HEX}`.
    InvalidEscape(String),
    /// A `"""` hint with no indented lines after it.
    MissingMultilineValue,
    /// A line is indented more deeply than a key that already has a value.
    UnexpectedIndent,
    /// A list item in a section that contains map keys.
    UnexpectedListItem,
    /// A map key in a section that contains list items.
    UnexpectedMapKey,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidUtf8 => write!(f, "invalid UTF-8"),
            DecodeError::UnclosedQuotes => write!(f, "unclosed quotes"),
            DecodeError::CharactersAfterQuotes => write!(f, "characters after quotes"),
            DecodeError::InvalidEscape(escape) => write!(f, "invalid escape code: {}", escape),
            DecodeError::MissingMultilineValue => write!(f, "missing multiline value"),
            DecodeError::UnexpectedIndent => write!(f, "unexpected indent"),
            DecodeError::UnexpectedListItem => write!(f, "unexpected list item"),
            DecodeError::UnexpectedMapKey => write!(f, "unexpected map key"),
        }
    }
}

impl std::error::Error for DecodeError {}
