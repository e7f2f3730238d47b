//! Matching a document tree against a schema.
//!
//! Every definition and matcher tried against a value is recorded as an
//! [`Attempt`] at the value's [`Position`], whether or not it matched. Errors
//! are gathered per position and only reduced to messages at the end, so
//! that alternatives of a `one of` can be compared as a whole.

use std::collections::{BTreeMap, HashSet};

use conl_tokenizer::{DecodeError, quote};
use conl_tree::{Document, Entry, Value};
use regex::Regex;

use crate::schema::{DefId, Matcher, MatcherId, MatcherKind, Shape};
use crate::{Position, Schema, ValidationError, ValidationErrorKind, ValidationResult};

pub(crate) type Failures = BTreeMap<Position, Vec<ValidationErrorKind>>;

/// Something tried against the value at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attempt {
    Matcher { id: MatcherId, ok: bool },
    Definition { id: DefId, ok: bool },
    /// A map key accepted by a key matcher, with the matcher for its value.
    Key { key: MatcherId, value: MatcherId },
}

pub(crate) type Attempts = BTreeMap<Position, Vec<Attempt>>;

/// Validate a parsed document. `extra` errors (such as a failure to load the
/// document's schema) are reported alongside the document's own.
pub(crate) fn validate(
    schema: &Schema,
    document: Document,
    extra: Vec<ValidationError>,
) -> ValidationResult {
    let mut validator = Validator {
        schema,
        attempts: Attempts::new(),
    };
    let mut failures = validator.matcher(schema.root(), &document.root, Position::ROOT);

    decode_errors(&document, &mut failures);
    for error in extra {
        add(&mut failures, error.position, error.kind);
    }

    let errors = report(failures);
    crate::debug!(errors = errors.len(), "validated document");
    ValidationResult::new(schema.clone(), document, validator.attempts, errors)
}

struct Validator<'a> {
    schema: &'a Schema,
    attempts: Attempts,
}

fn add(failures: &mut Failures, position: Position, kind: ValidationErrorKind) {
    failures.entry(position).or_default().push(kind);
}

fn single(position: Position, kind: ValidationErrorKind) -> Failures {
    let mut failures = Failures::new();
    add(&mut failures, position, kind);
    failures
}

fn expected(position: Position, what: &str) -> Failures {
    single(
        position,
        ValidationErrorKind::ExpectedMatch(vec![what.to_string()]),
    )
}

fn extend(failures: &mut Failures, more: Failures) {
    for (position, kinds) in more {
        failures.entry(position).or_default().extend(kinds);
    }
}

impl<'a> Validator<'a> {
    fn record(&mut self, position: Position, attempt: Attempt) {
        self.attempts.entry(position).or_default().push(attempt);
    }

    fn matcher(&mut self, id: MatcherId, value: &Value, position: Position) -> Failures {
        let schema = self.schema;
        let matcher = schema.matcher(id);
        let failures = match &matcher.kind {
            MatcherKind::Pattern { regex, .. } => pattern(matcher, regex, value, position),
            MatcherKind::Reference { target, .. } => self.definition(*target, value, position),
        };
        crate::trace!(
            line = position.line,
            matcher = %matcher.description(),
            ok = failures.is_empty(),
            "matcher"
        );
        self.record(
            position,
            Attempt::Matcher {
                id,
                ok: failures.is_empty(),
            },
        );
        failures
    }

    fn definition(&mut self, id: DefId, value: &Value, position: Position) -> Failures {
        let schema = self.schema;
        let definition = schema.definition(id);
        let failures = match (value, &definition.shape) {
            (Value::Scalar(token), _) if token.error.is_some() => {
                decode(position, token.error.as_ref())
            }
            (_, Shape::Empty) => {
                if value.is_empty() {
                    Failures::new()
                } else {
                    expected(position, "no value")
                }
            }
            (Value::Map(_) | Value::List(_), Shape::Scalar(_)) => {
                expected(position, "any scalar")
            }
            (_, Shape::Scalar(m)) => self.matcher(*m, value, position),
            (_, Shape::OneOf(alternatives)) => self.one_of(alternatives, value, position),
            (_, Shape::Keys { keys, required }) => self.keys(keys, required, value, position),
            (_, Shape::Items { items, required }) => {
                self.items(*items, required, value, position)
            }
        };
        self.record(
            position,
            Attempt::Definition {
                id,
                ok: failures.is_empty(),
            },
        );
        failures
    }

    fn one_of(&mut self, alternatives: &[MatcherId], value: &Value, position: Position) -> Failures {
        // Every alternative is tried so that all of them are recorded.
        let mut best: Option<Failures> = None;
        let mut matched = false;
        for id in alternatives {
            let failures = self.matcher(*id, value, position);
            if failures.is_empty() {
                matched = true;
            }
            best = Some(match best {
                None => failures,
                Some(best) => merge(best, failures),
            });
        }
        if matched {
            Failures::new()
        } else {
            best.unwrap_or_default()
        }
    }

    fn keys(
        &mut self,
        keys: &[(MatcherId, MatcherId)],
        required: &[(MatcherId, MatcherId)],
        value: &Value,
        position: Position,
    ) -> Failures {
        let entries: &[Entry] = match value {
            Value::Empty => &[],
            Value::Map(entries) => entries,
            _ => return expected(position, "a map"),
        };

        let schema = self.schema;
        let mut failures = Failures::new();
        let mut keys_seen = HashSet::new();
        let mut required_seen = vec![false; required.len()];
        for entry in entries {
            let key_position = Position::key(entry.line());
            if let Some(error) = &entry.key.error {
                add(
                    &mut failures,
                    key_position,
                    ValidationErrorKind::Decode(error.clone()),
                );
                continue;
            }
            let key = entry.key.content.as_ref();
            if !keys_seen.insert(key) {
                add(
                    &mut failures,
                    key_position,
                    ValidationErrorKind::DuplicateKey(quote(key).into_owned()),
                );
                continue;
            }

            let found = required
                .iter()
                .position(|(k, _)| schema.accepts_scalar(*k, key));
            let pair = match found {
                Some(index) if required_seen[index] => {
                    let description = schema.matcher(required[index].0).description();
                    add(
                        &mut failures,
                        key_position,
                        ValidationErrorKind::DuplicateKey(description),
                    );
                    continue;
                }
                Some(index) => {
                    required_seen[index] = true;
                    Some(required[index])
                }
                None => keys
                    .iter()
                    .find(|(k, _)| schema.accepts_scalar(*k, key))
                    .copied(),
            };

            match pair {
                Some((key_matcher, value_matcher)) => {
                    self.record(
                        key_position,
                        Attempt::Key {
                            key: key_matcher,
                            value: value_matcher,
                        },
                    );
                    let more =
                        self.matcher(value_matcher, &entry.value, Position::value(entry.line()));
                    extend(&mut failures, more);
                }
                None => add(
                    &mut failures,
                    key_position,
                    ValidationErrorKind::Unexpected(format!("key {}", quote(key))),
                ),
            }
        }

        let missing: Vec<String> = required
            .iter()
            .zip(&required_seen)
            .filter(|(_, seen)| !**seen)
            .flat_map(|((key, _), _)| schema.matcher(*key).expected())
            .collect();
        if !missing.is_empty() {
            add(
                &mut failures,
                position,
                ValidationErrorKind::MissingRequiredKey(missing),
            );
        }
        failures
    }

    fn items(
        &mut self,
        items: Option<MatcherId>,
        required: &[MatcherId],
        value: &Value,
        position: Position,
    ) -> Failures {
        let entries: &[Entry] = match value {
            Value::Empty => &[],
            Value::List(entries) => entries,
            _ => return expected(position, "a list"),
        };

        let mut failures = Failures::new();
        for (index, entry) in entries.iter().enumerate() {
            if let Some(error) = &entry.key.error {
                add(
                    &mut failures,
                    Position::key(entry.line()),
                    ValidationErrorKind::Decode(error.clone()),
                );
                continue;
            }
            match required.get(index).copied().or(items) {
                Some(id) => {
                    let more = self.matcher(id, &entry.value, Position::value(entry.line()));
                    extend(&mut failures, more);
                }
                None => add(
                    &mut failures,
                    Position::key(entry.line()),
                    ValidationErrorKind::Unexpected("list item".to_string()),
                ),
            }
        }

        if let Some(missing) = required.get(entries.len()) {
            let description = self.schema.matcher(*missing).description();
            add(
                &mut failures,
                position,
                ValidationErrorKind::MissingRequiredItem(description),
            );
        }
        failures
    }
}

fn decode(position: Position, error: Option<&DecodeError>) -> Failures {
    match error {
        Some(error) => single(position, ValidationErrorKind::Decode(error.clone())),
        None => Failures::new(),
    }
}

fn pattern(matcher: &Matcher, regex: &Regex, value: &Value, position: Position) -> Failures {
    let matched = match value {
        Value::Scalar(token) if token.error.is_some() => {
            return decode(position, token.error.as_ref());
        }
        Value::Scalar(token) => regex.is_match(&token.content),
        Value::Empty | Value::Map(_) | Value::List(_) => {
            return expected(position, "any scalar");
        }
    };
    if matched {
        Failures::new()
    } else {
        single(
            position,
            ValidationErrorKind::ExpectedMatch(matcher.expected()),
        )
    }
}

/// Pick between the failures of two alternatives.
///
/// The one whose first error is on a later line got further and wins; then
/// the one with more errors. Otherwise both are kept.
fn merge(a: Failures, b: Failures) -> Failures {
    let rank = |failures: &Failures| {
        let first = failures.keys().next().map(|p| p.line);
        let count: usize = failures.values().map(Vec::len).sum();
        (first, count)
    };
    match rank(&a).cmp(&rank(&b)) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            let mut both = a;
            extend(&mut both, b);
            both
        }
    }
}

/// Decode errors are reported wherever they are, including in parts of the
/// document that no matcher reached.
fn decode_errors(document: &Document, failures: &mut Failures) {
    fn walk(value: &Value, failures: &mut Failures) {
        for entry in value.entries() {
            let line = entry.line();
            if let Some(error) = &entry.key.error {
                add(failures, Position::key(line), ValidationErrorKind::Decode(error.clone()));
            }
            let hint_error = entry.hint.as_ref().and_then(|h| h.error.as_ref());
            let scalar_error = entry.value.as_scalar().and_then(|t| t.error.as_ref());
            if let Some(error) = hint_error.or(scalar_error) {
                add(failures, Position::value(line), ValidationErrorKind::Decode(error.clone()));
            }
            walk(&entry.value, failures);
        }
    }

    walk(&document.root, failures);
    for comment in &document.comments {
        if let Some(error) = &comment.error {
            add(
                failures,
                Position::value(comment.line),
                ValidationErrorKind::Decode(error.clone()),
            );
        }
    }
}

/// Reduce each position to its highest priority errors, in line order.
fn report(failures: Failures) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = failures
        .into_iter()
        .filter_map(|(position, kinds)| {
            collapse(kinds).map(|kind| ValidationError::new(position, kind))
        })
        .collect();
    errors.sort_by_key(|e| (e.line(), e.position.side));
    errors
}

fn collapse(kinds: Vec<ValidationErrorKind>) -> Option<ValidationErrorKind> {
    let top = kinds.iter().map(ValidationErrorKind::priority).max()?;
    let mut kinds = kinds.into_iter().filter(|k| k.priority() == top);
    let first = kinds.next()?;
    Some(match first {
        ValidationErrorKind::ExpectedMatch(mut all) => {
            for kind in kinds {
                if let ValidationErrorKind::ExpectedMatch(more) = kind {
                    all.extend(more);
                }
            }
            all.sort();
            all.dedup();
            ValidationErrorKind::ExpectedMatch(all)
        }
        ValidationErrorKind::MissingRequiredKey(mut all) => {
            for kind in kinds {
                if let ValidationErrorKind::MissingRequiredKey(more) = kind {
                    all.extend(more);
                }
            }
            all.sort();
            all.dedup();
            ValidationErrorKind::MissingRequiredKey(all)
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn expected_at(line: usize, what: &[&str]) -> Failures {
        single(
            Position::value(line),
            ValidationErrorKind::ExpectedMatch(what.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[test]
    fn test_merge_prefers_later_lines() {
        let merged = merge(expected_at(2, &["a"]), expected_at(5, &["b"]));
        assert_eq!(merged, expected_at(5, &["b"]));
    }

    #[test]
    fn test_merge_prefers_more_errors() {
        let mut more = expected_at(3, &["a"]);
        add(
            &mut more,
            Position::value(4),
            ValidationErrorKind::Unexpected("list item".into()),
        );
        let merged = merge(expected_at(3, &["b"]), more.clone());
        assert_eq!(merged, more);
    }

    #[test]
    fn test_merge_ties_are_unioned() {
        let merged = merge(expected_at(3, &["true"]), expected_at(3, &["false"]));
        let errors = report(merged);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "3: expected false or true");
    }

    #[test]
    fn test_collapse_keeps_highest_priority() {
        let kinds = vec![
            ValidationErrorKind::ExpectedMatch(vec!["x".into()]),
            ValidationErrorKind::MissingRequiredKey(vec!["b".into()]),
            ValidationErrorKind::MissingRequiredKey(vec!["a".into(), "b".into()]),
        ];
        assert_eq!(
            collapse(kinds),
            Some(ValidationErrorKind::MissingRequiredKey(vec![
                "a".into(),
                "b".into()
            ]))
        );
        assert_eq!(collapse(Vec::new()), None);
    }

    #[test]
    fn test_report_order() {
        let mut failures = Failures::new();
        add(
            &mut failures,
            Position::ROOT,
            ValidationErrorKind::MissingRequiredKey(vec!["username".into()]),
        );
        add(
            &mut failures,
            Position::key(1),
            ValidationErrorKind::Unexpected("key password".into()),
        );
        add(
            &mut failures,
            Position::value(2),
            ValidationErrorKind::ExpectedMatch(vec!["x".into()]),
        );
        let lines: Vec<String> = report(failures).iter().map(|e| e.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "1: unexpected key password",
                "1: missing required key username",
                "2: expected x",
            ]
        );
    }
}
