//! Line and literal scanning.
//!
//! Everything here works on bytes so that invalid UTF-8 can be reported
//! per token instead of rejecting the whole input.

use std::borrow::Cow;

use crate::DecodeError;

/// Physical lines split on `\r\n`, `\r` or `\n`, numbered from 1.
pub(crate) struct Lines<'src> {
    remaining: Option<&'src [u8]>,
    line: usize,
}

impl<'src> Lines<'src> {
    pub(crate) fn new(input: &'src [u8]) -> Self {
        Self {
            remaining: Some(input),
            line: 0,
        }
    }
}

impl<'src> Iterator for Lines<'src> {
    type Item = (usize, &'src [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let input = self.remaining?;
        self.line += 1;
        match input.iter().position(|&c| c == b'\n' || c == b'\r') {
            Some(end) => {
                let skip = if input[end..].starts_with(b"\r\n") { 2 } else { 1 };
                self.remaining = Some(&input[end + skip..]);
                Some((self.line, &input[..end]))
            }
            None => {
                self.remaining = None;
                Some((self.line, input))
            }
        }
    }
}

#[inline]
fn is_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Split a line into its leading spaces and tabs, and the rest.
pub(crate) fn split_indent(line: &[u8]) -> (&[u8], &[u8]) {
    let n = line.iter().take_while(|&&c| is_blank(c)).count();
    line.split_at(n)
}

pub(crate) fn trim_start(input: &[u8]) -> &[u8] {
    split_indent(input).1
}

pub(crate) fn trim_end(input: &[u8]) -> &[u8] {
    let n = input.iter().rev().take_while(|&&c| is_blank(c)).count();
    &input[..input.len() - n]
}

fn find(input: &[u8], byte: u8) -> Option<usize> {
    input.iter().position(|&c| c == byte)
}

/// Split the literal at the start of `input` from whatever follows it.
///
/// Quoted literals run to the closing quote (anything between the closing
/// quote and the next separator stays attached so it can be reported).
/// Unquoted literals stop at the first `;` and, for keys, the first `=`.
/// For keys the `=` itself is consumed; a `;` is left at the start of the
/// remainder so the caller can emit a comment.
pub(crate) fn split_literal(input: &[u8], key: bool) -> (&[u8], &[u8]) {
    if input.first() != Some(&b'"') {
        return split_unquoted(input, key);
    }

    let mut escaped = false;
    for (i, &c) in input.iter().enumerate().skip(1) {
        if c == b'"' && !escaped {
            let (tail, rest) = split_unquoted(&input[i..], key);
            return (&input[..i + tail.len()], rest);
        }
        escaped = c == b'\\' && !escaped;
    }
    (input, &[])
}

fn split_unquoted(input: &[u8], key: bool) -> (&[u8], &[u8]) {
    if key && let Some(eq) = find(input, b'=') {
        if let Some(semi) = find(&input[..eq], b';') {
            return (trim_end(&input[..semi]), &input[semi..]);
        }
        return (trim_end(&input[..eq]), &input[eq + 1..]);
    }

    match find(input, b';') {
        Some(semi) => (trim_end(&input[..semi]), &input[semi..]),
        None => (trim_end(input), &[]),
    }
}

/// Check that `content` is valid UTF-8.
pub(crate) fn check_utf8(content: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(content).map_err(|_| DecodeError::InvalidUtf8)
}

/// Decode a literal as it appears in a document.
///
/// Bare literals are returned as-is. Quoted literals must be closed, must
/// not be followed by anything, and may only use the escapes `\n`, `\r`,
/// `\t`, `\"`, `\\` and `\{HEX}` (1 to 8 hex digits naming a code point).
///
/// ```
/// use conl_tokenizer::{DecodeError, decode_literal};
///
/// assert_eq!(decode_literal(b"plain").unwrap(), "plain");
/// assert_eq!(decode_literal(br#""a\tb\{1F600}""#).unwrap(), "a\tb\u{1F600}");
/// assert_eq!(decode_literal(br#""open"#), Err(DecodeError::UnclosedQuotes));
/// ```
pub fn decode_literal(input: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    let text = check_utf8(input)?;
    let Some(quoted) = text.strip_prefix('"') else {
        return Ok(Cow::Borrowed(text));
    };

    let body = closing_quote(quoted)
        .ok_or(DecodeError::UnclosedQuotes)
        .and_then(|end| {
            if end + 1 == quoted.len() {
                Ok(&quoted[..end])
            } else {
                Err(DecodeError::CharactersAfterQuotes)
            }
        })?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\')) => out.push(c),
            Some('{') => {
                let mut digits = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    digits.push(c);
                }
                match code_point(&digits) {
                    Some(c) if closed => out.push(c),
                    _ => {
                        let close = if closed { "}" } else { "" };
                        return Err(DecodeError::InvalidEscape(format!("\\{{{digits}{close}")));
                    }
                }
            }
            Some(other) => return Err(DecodeError::InvalidEscape(format!("\\{other}"))),
            None => return Err(DecodeError::InvalidEscape("\\".to_string())),
        }
    }
    Ok(Cow::Owned(out))
}

/// Byte offset of the unescaped closing quote in the text after the opening quote.
fn closing_quote(quoted: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in quoted.char_indices() {
        if c == '"' && !escaped {
            return Some(i);
        }
        escaped = c == '\\' && !escaped;
    }
    None
}

fn code_point(digits: &str) -> Option<char> {
    if digits.is_empty() || digits.len() > 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
}

fn requires_quote(c: char) -> bool {
    c.is_control() || c == ';' || c == '='
}

/// Encode `s` as a literal that [`decode_literal`] turns back into `s`.
///
/// ```
/// use conl_tokenizer::quote;
///
/// assert_eq!(quote("hello world"), "hello world");
/// assert_eq!(quote("a = b"), r#""a = b""#);
/// assert_eq!(quote(""), r#""""#);
/// ```
pub fn quote(s: &str) -> Cow<'_, str> {
    let needs_quotes = s.is_empty()
        || s.starts_with('"')
        || s.starts_with(' ')
        || s.ends_with(' ')
        || s.contains(requires_quote);
    if !needs_quotes {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\{{{:02X}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any string survives quoting.
        #[test]
        fn quoted_round_trip(s in any::<String>()) {
            let encoded = quote(&s);
            let decoded = decode_literal(encoded.as_bytes());
            prop_assert_eq!(decoded.as_deref(), Ok(s.as_str()));
        }

        /// Strings without control characters or surrounding spaces need no quotes.
        #[test]
        fn bare_round_trip(s in "[^\\p{Cc}\";= ][^\\p{Cc};=]*[^\\p{Cc};= ]|[^\\p{Cc}\";= ]") {
            let (literal, rest) = split_literal(s.as_bytes(), false);
            prop_assert!(rest.is_empty());
            let decoded = decode_literal(literal);
            prop_assert_eq!(decoded.as_deref(), Ok(s.as_str()));
        }
    }
}
