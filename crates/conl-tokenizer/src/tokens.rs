//! The normalized token stream.

use std::collections::VecDeque;

use crate::{DecodeError, Lexer, Token, TokenKind};

/// A token stream with structural invariants enforced.
///
/// Wraps a [`Lexer`] and repairs its output:
///
/// - an indented line under a key that already has a value (or under
///   nothing at all) becomes an entry carrying
///   [`DecodeError::UnexpectedIndent`], so the nested section still has an
///   owner;
/// - a list item in a map section, or a map key in a list section, is
///   replaced by an entry of the section's kind carrying an error;
/// - [`TokenKind::NoValue`] is synthesized for entries with no value;
/// - every open section is closed with [`TokenKind::Outdent`] at the end.
pub struct Tokens<'src> {
    lexer: Lexer<'src>,
    sections: Vec<Section>,
    pending: VecDeque<Token<'src>>,
    last_line: usize,
    finished: bool,
}

#[derive(Default)]
struct Section {
    /// Whether the section holds map keys or list items, once known.
    kind: Option<TokenKind>,
    /// Whether the last entry is still waiting for its value.
    has_key: bool,
}

impl<'src> Tokens<'src> {
    /// Create a normalized token stream for the given source.
    pub fn new(input: &'src [u8]) -> Self {
        Self {
            lexer: Lexer::new(input),
            sections: vec![Section::default()],
            pending: VecDeque::new(),
            last_line: 0,
            finished: false,
        }
    }

    /// Skip comments and multiline hints.
    pub fn without_trivia(self) -> impl Iterator<Item = Token<'src>> {
        self.filter(|t| !t.kind.is_trivia())
    }

    fn section(&mut self) -> &mut Section {
        if self.sections.is_empty() {
            self.sections.push(Section::default());
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    fn process(&mut self, token: Token<'src>) {
        let line = token.line;
        match token.kind {
            TokenKind::Indent => {
                let section = self.section();
                if section.has_key {
                    section.has_key = false;
                } else {
                    let kind = *section.kind.get_or_insert(TokenKind::MapKey);
                    self.pending.push_back(Token::error(
                        kind,
                        "",
                        line,
                        DecodeError::UnexpectedIndent,
                    ));
                }
                self.sections.push(Section::default());
            }
            TokenKind::Outdent => {
                if self.sections.len() > 1
                    && let Some(section) = self.sections.pop()
                    && section.has_key
                {
                    self.pending.push_back(Token::empty(TokenKind::NoValue, line));
                }
            }
            TokenKind::MapKey | TokenKind::ListItem => {
                let section = self.section();
                let kind = *section.kind.get_or_insert(token.kind);
                let had_key = std::mem::replace(&mut section.has_key, true);
                if had_key {
                    self.pending.push_back(Token::empty(TokenKind::NoValue, line));
                }
                if kind != token.kind {
                    let error = match token.kind {
                        TokenKind::ListItem => DecodeError::UnexpectedListItem,
                        _ => DecodeError::UnexpectedMapKey,
                    };
                    self.pending.push_back(Token::error(kind, "", line, error));
                    return;
                }
            }
            TokenKind::Scalar | TokenKind::MultilineScalar => self.section().has_key = false,
            TokenKind::Comment | TokenKind::MultilineHint | TokenKind::NoValue => {}
        }
        self.pending.push_back(token);
    }

    fn finish(&mut self) {
        let line = self.last_line;
        while let Some(section) = self.sections.pop() {
            if section.has_key {
                self.pending.push_back(Token::empty(TokenKind::NoValue, line));
            }
            if !self.sections.is_empty() {
                self.pending.push_back(Token::empty(TokenKind::Outdent, line));
            }
        }
        self.finished = true;
    }
}

impl<'src> Iterator for Tokens<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                self.last_line = token.line;
                return Some(token);
            }
            if self.finished {
                return None;
            }
            match self.lexer.next() {
                Some(token) => self.process(token),
                None => self.finish(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Tokens::new(source.as_bytes()).map(|t| t.kind).collect()
    }

    fn errors(source: &str) -> Vec<(usize, TokenKind, DecodeError)> {
        Tokens::new(source.as_bytes())
            .filter_map(|t| t.error.map(|e| (t.line, t.kind, e)))
            .collect()
    }

    #[test]
    fn test_no_value() {
        assert_eq!(
            kinds("a\nb = 1"),
            vec![
                TokenKind::MapKey,
                TokenKind::NoValue,
                TokenKind::MapKey,
                TokenKind::Scalar,
            ]
        );
        assert_eq!(kinds("a"), vec![TokenKind::MapKey, TokenKind::NoValue]);
        assert_eq!(kinds("="), vec![TokenKind::ListItem, TokenKind::NoValue]);
    }

    #[test]
    fn test_no_value_before_outdent() {
        assert_eq!(
            kinds("a\n  b\nc = 1"),
            vec![
                TokenKind::MapKey,
                TokenKind::Indent,
                TokenKind::MapKey,
                TokenKind::NoValue,
                TokenKind::Outdent,
                TokenKind::MapKey,
                TokenKind::Scalar,
            ]
        );
    }

    #[test]
    fn test_closes_sections_at_end() {
        let tokens: Vec<_> = Tokens::new(b"a\n  b\n    c").collect();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::MapKey,
                TokenKind::Indent,
                TokenKind::MapKey,
                TokenKind::Indent,
                TokenKind::MapKey,
                TokenKind::NoValue,
                TokenKind::Outdent,
                TokenKind::Outdent,
            ]
        );
        assert!(tokens[5..].iter().all(|t| t.line == 3));
    }

    #[test]
    fn test_unexpected_indent() {
        assert_eq!(
            errors("a = 1\n  b = 2"),
            vec![(2, TokenKind::MapKey, DecodeError::UnexpectedIndent)]
        );
        assert_eq!(
            errors("  = 1"),
            vec![(1, TokenKind::MapKey, DecodeError::UnexpectedIndent)]
        );
        assert_eq!(
            kinds("a = 1\n  b = 2"),
            vec![
                TokenKind::MapKey,
                TokenKind::Scalar,
                TokenKind::MapKey,
                TokenKind::Indent,
                TokenKind::MapKey,
                TokenKind::Scalar,
                TokenKind::Outdent,
            ]
        );
    }

    #[test]
    fn test_mixed_sections() {
        assert_eq!(
            errors("a = 1\n= 2"),
            vec![(2, TokenKind::MapKey, DecodeError::UnexpectedListItem)]
        );
        assert_eq!(
            errors("= 1\na = 2"),
            vec![(2, TokenKind::ListItem, DecodeError::UnexpectedMapKey)]
        );
        assert_eq!(
            kinds("= 1\na = 2"),
            vec![
                TokenKind::ListItem,
                TokenKind::Scalar,
                TokenKind::ListItem,
                TokenKind::Scalar,
            ]
        );
    }

    #[test]
    fn test_without_trivia() {
        let kinds: Vec<_> = Tokens::new(b"; c\na = \"\"\"\n  x")
            .without_trivia()
            .map(|t| t.kind)
            .collect();
        assert_eq!(kinds, vec![TokenKind::MapKey, TokenKind::MultilineScalar]);
    }
}
