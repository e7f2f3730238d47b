//! Line-oriented lexer for CONL.

use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::trace;

use crate::scanner::{Lines, check_utf8, decode_literal, split_indent, split_literal, trim_start};
use crate::{DecodeError, Token, TokenKind};

/// A lexer that produces raw tokens from CONL source, one line at a time.
///
/// The raw stream tracks indentation but does not enforce any structure:
/// a key may be followed by nothing, sections may mix keys and list items.
/// Use [`Tokens`](crate::Tokens) for the normalized stream.
pub struct Lexer<'src> {
    lines: Lines<'src>,
    /// Indentation of each open section; the root has no indentation.
    stack: Vec<&'src [u8]>,
    multiline: Option<Multiline<'src>>,
    pending: VecDeque<Token<'src>>,
    done: bool,
}

/// State for a multiline value after a `"""` hint.
struct Multiline<'src> {
    /// Line of the key that introduced the value, until content is found.
    line: usize,
    /// Indentation of the first content line, stripped from every line.
    prefix: Option<&'src [u8]>,
    value: Vec<u8>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source.
    pub fn new(input: &'src [u8]) -> Self {
        Self {
            lines: Lines::new(input),
            stack: vec![&b""[..]],
            multiline: None,
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn push(&mut self, token: Token<'src>) {
        trace!(
            "Token {:?} at line {}: {:?} ({:?})",
            token.kind, token.line, token.content, token.error
        );
        self.pending.push_back(token);
    }

    fn comment(&mut self, content: &'src [u8], line: usize) {
        self.push(utf8_token(TokenKind::Comment, content, line));
    }

    fn top(&self) -> &'src [u8] {
        self.stack.last().copied().unwrap_or(b"")
    }

    /// Feed a line to an open multiline value. Returns true if the line was consumed.
    fn continue_multiline(
        &mut self,
        line: usize,
        indent: &'src [u8],
        rest: &'src [u8],
        content: &'src [u8],
    ) -> bool {
        let top = self.top();
        let Some(multiline) = self.multiline.as_mut() else {
            return false;
        };

        match multiline.prefix {
            None if !rest.is_empty() && indent.starts_with(top) && indent != top => {
                multiline.line = line;
                multiline.prefix = Some(indent);
                multiline.value.extend_from_slice(rest);
                return true;
            }
            None if rest.is_empty() => return true,
            None => {}
            Some(prefix) => {
                if let Some(tail) = content.strip_prefix(prefix) {
                    multiline.value.push(b'\n');
                    multiline.value.extend_from_slice(tail);
                    return true;
                }
                if rest.is_empty() {
                    multiline.value.push(b'\n');
                    return true;
                }
            }
        }

        self.finish_multiline();
        false
    }

    fn finish_multiline(&mut self) {
        let Some(multiline) = self.multiline.take() else {
            return;
        };
        let token = match multiline.prefix {
            None => Token::error(
                TokenKind::MultilineScalar,
                "",
                multiline.line,
                DecodeError::MissingMultilineValue,
            ),
            Some(_) => {
                let end = multiline
                    .value
                    .iter()
                    .rposition(|c| !matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
                    .map_or(0, |i| i + 1);
                let mut value = multiline.value;
                value.truncate(end);
                match String::from_utf8(value) {
                    Ok(content) => Token::new(TokenKind::MultilineScalar, content, multiline.line),
                    Err(err) => Token::error(
                        TokenKind::MultilineScalar,
                        String::from_utf8_lossy(err.as_bytes()).into_owned(),
                        multiline.line,
                        DecodeError::InvalidUtf8,
                    ),
                }
            }
        };
        self.push(token);
    }

    fn scan_line(&mut self, line: usize, content: &'src [u8]) {
        let (indent, rest) = split_indent(content);

        if self.multiline.is_some() && self.continue_multiline(line, indent, rest, content) {
            return;
        }

        if rest.is_empty() {
            return;
        }
        if let Some(comment) = rest.strip_prefix(b";") {
            self.comment(comment, line);
            return;
        }

        while !indent.starts_with(self.top()) {
            self.stack.pop();
            self.push(Token::empty(TokenKind::Outdent, line));
        }
        if indent != self.top() {
            self.stack.push(indent);
            self.push(utf8_token(TokenKind::Indent, indent, line));
        }

        let rest = match rest.strip_prefix(b"=") {
            Some(item) => {
                self.push(Token::empty(TokenKind::ListItem, line));
                trim_start(item)
            }
            None => {
                let (key, after) = split_literal(rest, true);
                self.push(literal_token(TokenKind::MapKey, key, line));
                trim_start(after)
            }
        };

        if let Some(comment) = rest.strip_prefix(b";") {
            self.comment(comment, line);
            return;
        }

        if let Some(hint) = rest.strip_prefix(b"\"\"\"") {
            let (hint, after) = split_literal(hint, false);
            let token = match check_utf8(hint) {
                Ok(text) if text.starts_with('"') => Token::error(
                    TokenKind::MultilineHint,
                    text,
                    line,
                    DecodeError::CharactersAfterQuotes,
                ),
                _ => utf8_token(TokenKind::MultilineHint, hint, line),
            };
            self.push(token);
            self.multiline = Some(Multiline {
                line,
                prefix: None,
                value: Vec::new(),
            });
            if let Some(comment) = after.strip_prefix(b";") {
                self.comment(comment, line);
            }
            return;
        }

        let (value, after) = split_literal(rest, false);
        if !value.is_empty() {
            self.push(literal_token(TokenKind::Scalar, value, line));
        }
        if let Some(comment) = after.strip_prefix(b";") {
            self.comment(comment, line);
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            match self.lines.next() {
                Some((line, content)) => self.scan_line(line, content),
                None => {
                    self.finish_multiline();
                    self.done = true;
                }
            }
        }
    }
}

/// A token whose content is taken verbatim, after a UTF-8 check.
fn utf8_token(kind: TokenKind, content: &[u8], line: usize) -> Token<'_> {
    match check_utf8(content) {
        Ok(text) => Token::new(kind, text, line),
        Err(err) => Token::error(kind, lossy(content), line, err),
    }
}

/// A token whose content is a decoded literal.
fn literal_token(kind: TokenKind, literal: &[u8], line: usize) -> Token<'_> {
    match decode_literal(literal) {
        Ok(text) => Token::new(kind, text, line),
        Err(err) => Token::error(kind, lossy(literal), line, err),
    }
}

fn lossy(content: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(content)
}
