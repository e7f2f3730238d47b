//! Document tree representation for CONL files.
//!
//! Builds a tree of [`Value`]s from the normalized token stream of
//! [`conl_tokenizer`]. Parsing never fails: decode errors stay on the tokens
//! that caused them and can be listed with [`Document::errors`].
//!
//! ```
//! let doc = conl_tree::parse(b"name = Alice\nports\n  = 80\n  = 443");
//! assert_eq!(doc.root.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert_eq!(doc.root.get("ports").and_then(|v| v.item(1)).and_then(|v| v.as_str()), Some("443"));
//! ```

mod builder;
mod value;

pub use builder::TreeBuilder;
pub use conl_tokenizer::{DecodeError, Token, TokenKind};
pub use value::{Entry, Value};

/// Parse a CONL document into a tree.
pub fn parse(input: &[u8]) -> Document {
    let mut builder = TreeBuilder::new();
    for token in conl_tokenizer::tokens(input) {
        builder.token(token);
    }
    builder.finish()
}

/// A CONL document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Document {
    /// The root value: a map, a list, or nothing for an empty document.
    pub root: Value,
    /// Comments in document order.
    pub comments: Vec<Token<'static>>,
}

impl Document {
    /// Parse a CONL document.
    pub fn parse(input: &[u8]) -> Self {
        parse(input)
    }

    /// Tokens that failed to decode, ordered by line.
    pub fn errors(&self) -> impl Iterator<Item = &Token<'static>> {
        let mut tokens = Vec::new();
        self.root.visit_tokens(&mut |token| {
            if token.error.is_some() {
                tokens.push(token);
            }
        });
        tokens.extend(self.comments.iter().filter(|t| t.error.is_some()));
        tokens.sort_by_key(|t| t.line);
        tokens.into_iter()
    }

    /// Whether the document parsed without decode errors.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// A JSON view of the document.
    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_json()
    }
}
