//! Regular expressions that can be listed as literal strings.

/// The strings a pattern matches, if it is an alternation of literals.
///
/// `a|b c` matches exactly `a` and `b c`. An escaped punctuation character
/// such as `\.` stands for itself. Anything else that has a meaning in a
/// regular expression makes the pattern open-ended, and `None` is returned.
pub(crate) fn literals(raw: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if escaped.is_ascii_punctuation() => current.push(escaped),
                _ => return None,
            },
            '|' => out.push(non_empty(std::mem::take(&mut current))?),
            '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' => return None,
            c => current.push(c),
        }
    }
    out.push(non_empty(current)?);
    Some(out)
}

fn non_empty(piece: String) -> Option<String> {
    (!piece.is_empty()).then_some(piece)
}

/// Join descriptions the way messages read them: `a`, `a or b`, `a, b or c`.
pub(crate) fn join_with_or(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}
