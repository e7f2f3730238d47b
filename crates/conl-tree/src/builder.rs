//! Tree builder from tokens.

use conl_tokenizer::{Token, TokenKind};

use crate::{Document, Entry, Value};

/// Builder that constructs a [`Document`] from a normalized token stream.
///
/// Feed it tokens in order with [`TreeBuilder::token`], then call
/// [`TreeBuilder::finish`]. Sections left open at the end are closed.
pub struct TreeBuilder {
    stack: Vec<Frame>,
    comments: Vec<Token<'static>>,
}

/// An open section.
struct Frame {
    kind: Option<TokenKind>,
    entries: Vec<Entry>,
    /// Line of the entry that owns this section, 0 at the root.
    parent_line: usize,
}

impl Frame {
    fn new(parent_line: usize) -> Self {
        Self {
            kind: None,
            entries: Vec::new(),
            parent_line,
        }
    }

    fn into_value(self) -> Value {
        if self.entries.is_empty() {
            return Value::Empty;
        }
        match self.kind {
            Some(TokenKind::ListItem) => Value::List(self.entries),
            _ => Value::Map(self.entries),
        }
    }
}

impl TreeBuilder {
    /// Create a new tree builder.
    pub fn new() -> Self {
        Self {
            stack: vec![Frame::new(0)],
            comments: Vec::new(),
        }
    }

    fn frame(&mut self) -> &mut Frame {
        if self.stack.is_empty() {
            self.stack.push(Frame::new(0));
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn last_entry(&mut self) -> Option<&mut Entry> {
        self.frame().entries.last_mut()
    }

    /// Add the next token to the tree.
    pub fn token(&mut self, token: Token<'_>) {
        match token.kind {
            TokenKind::MapKey | TokenKind::ListItem => {
                let frame = self.frame();
                frame.kind.get_or_insert(token.kind);
                let parent_line = frame.parent_line;
                frame.entries.push(Entry {
                    key: token.into_owned(),
                    hint: None,
                    value: Value::Empty,
                    parent_line,
                });
            }
            TokenKind::Scalar | TokenKind::MultilineScalar => {
                if let Some(entry) = self.last_entry() {
                    entry.value = Value::Scalar(token.into_owned());
                }
            }
            TokenKind::MultilineHint => {
                if let Some(entry) = self.last_entry() {
                    entry.hint = Some(token.into_owned());
                }
            }
            TokenKind::Indent => {
                let parent_line = self.last_entry().map_or(token.line, |e| e.line());
                self.stack.push(Frame::new(parent_line));
            }
            TokenKind::Outdent => self.close(),
            TokenKind::Comment => self.comments.push(token.into_owned()),
            TokenKind::NoValue => {}
        }
    }

    /// Close the innermost section and attach it to its owner.
    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let value = frame.into_value();
        if let Some(entry) = self.last_entry() {
            entry.value = value;
        }
    }

    /// Finish building and return the document.
    pub fn finish(mut self) -> Document {
        while self.stack.len() > 1 {
            self.close();
        }
        let root = self.stack.pop().map_or(Value::Empty, Frame::into_value);
        Document {
            root,
            comments: self.comments,
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
