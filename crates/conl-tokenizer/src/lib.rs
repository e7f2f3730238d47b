//! A tokenizer for CONL.
//!
//! Input is processed one physical line at a time by [`Lexer`], which
//! produces raw tokens. [`Tokens`] wraps the lexer and normalizes the stream
//! so that consumers can rely on a handful of invariants:
//!
//! - [`TokenKind::Indent`] and [`TokenKind::Outdent`] are always paired.
//! - Ignoring trivia, every [`TokenKind::MapKey`] or [`TokenKind::ListItem`]
//!   is followed by exactly one of [`TokenKind::Scalar`],
//!   [`TokenKind::MultilineScalar`], [`TokenKind::NoValue`] or
//!   [`TokenKind::Indent`].
//! - A section contains only map keys or only list items, never a mix.
//!
//! Decode failures never stop the stream: they are attached to the offending
//! token as a [`DecodeError`].
//!
//! ```
//! use conl_tokenizer::{TokenKind, tokens};
//!
//! let kinds: Vec<_> = tokens(b"a = 1\nb\n  = x").map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::MapKey,
//!         TokenKind::Scalar,
//!         TokenKind::MapKey,
//!         TokenKind::Indent,
//!         TokenKind::ListItem,
//!         TokenKind::Scalar,
//!         TokenKind::Outdent,
//!     ]
//! );
//! ```

mod error;
pub use error::DecodeError;

mod token;
pub use token::{Token, TokenKind};

mod scanner;
pub use scanner::{decode_literal, quote};

mod lexer;
pub use lexer::Lexer;

mod tokens;
pub use tokens::Tokens;

/// Tokenize `input` into a normalized token stream.
pub fn tokens(input: &[u8]) -> Tokens<'_> {
    Tokens::new(input)
}
