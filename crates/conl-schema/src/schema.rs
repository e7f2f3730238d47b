//! The schema model, and reading it from a schema document.
//!
//! Definitions and matchers live in two arenas and refer to each other by
//! index, so definitions may refer to themselves through nested keys or
//! items without any shared ownership.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use conl_tree::{Document, Entry, Value};
use regex::Regex;

use crate::{SchemaError, ValidationResult, pattern};

/// A schema that accepts any document.
pub const ANY_SCHEMA_SOURCE: &str = include_str!("../schemas/any.schema.conl");

/// The schema for schema documents.
pub const META_SCHEMA_SOURCE: &str = include_str!("../schemas/schema.schema.conl");

static ANY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::parse(ANY_SCHEMA_SOURCE.as_bytes()).expect("embedded any schema is valid")
});

static META: LazyLock<Schema> = LazyLock::new(|| {
    Schema::parse(META_SCHEMA_SOURCE.as_bytes()).expect("embedded meta schema is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct MatcherId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DefId(usize);

/// A parsed and resolved schema.
///
/// Cloning is cheap; the definitions are shared.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    docs: Option<String>,
    root: MatcherId,
    definitions: Vec<Definition>,
    matchers: Vec<Matcher>,
    names: HashMap<String, DefId>,
}

/// A named rule.
#[derive(Debug)]
pub(crate) struct Definition {
    pub(crate) name: String,
    pub(crate) docs: Option<String>,
    pub(crate) shape: Shape,
}

/// What a definition accepts.
#[derive(Debug)]
pub(crate) enum Shape {
    /// Only no value.
    Empty,
    Scalar(MatcherId),
    OneOf(Vec<MatcherId>),
    /// (key matcher, value matcher) pairs.
    Keys {
        keys: Vec<(MatcherId, MatcherId)>,
        required: Vec<(MatcherId, MatcherId)>,
    },
    Items {
        items: Option<MatcherId>,
        required: Vec<MatcherId>,
    },
}

impl Shape {
    /// Whether the shape describes a map or a list.
    pub(crate) fn is_container(&self) -> bool {
        matches!(self, Shape::Keys { .. } | Shape::Items { .. })
    }
}

#[derive(Debug)]
pub(crate) struct Matcher {
    pub(crate) kind: MatcherKind,
    pub(crate) docs: Option<String>,
    pub(crate) line: usize,
}

#[derive(Debug)]
pub(crate) enum MatcherKind {
    /// A regular expression, anchored at both ends.
    Pattern { raw: String, regex: Regex },
    /// `<name>`
    Reference { name: String, target: DefId },
}

impl Matcher {
    /// How the matcher is written in the schema.
    pub(crate) fn description(&self) -> String {
        match &self.kind {
            MatcherKind::Pattern { raw, .. } => raw.clone(),
            MatcherKind::Reference { name, .. } => format!("<{}>", name),
        }
    }

    /// What the matcher expects, as shown in messages: the literal strings
    /// it accepts where it can be listed, otherwise its description.
    pub(crate) fn expected(&self) -> Vec<String> {
        match &self.kind {
            MatcherKind::Pattern { raw, .. } => {
                pattern::literals(raw).unwrap_or_else(|| vec![raw.clone()])
            }
            MatcherKind::Reference { .. } => vec![self.description()],
        }
    }
}

impl Schema {
    /// Parse and resolve a schema document.
    ///
    /// ```
    /// use conl_schema::Schema;
    ///
    /// let schema = Schema::parse(b"root = <root>\ndefinitions\n  root\n    keys\n      name = .+\n").unwrap();
    /// assert!(schema.validate(b"name = Alice").is_valid());
    /// assert!(!schema.validate(b"age = 30").is_valid());
    /// ```
    pub fn parse(input: &[u8]) -> Result<Self, SchemaError> {
        let document = conl_tree::parse(input);
        if let Some(token) = document.errors().next() {
            return Err(SchemaError::Syntax {
                line: token.line,
                message: token.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        let inner = Reader::default().read(&document)?;
        check_cycles(&inner)?;
        crate::debug!(
            definitions = inner.definitions.len(),
            matchers = inner.matchers.len(),
            "parsed schema"
        );
        Ok(Schema {
            inner: Arc::new(inner),
        })
    }

    /// The schema that accepts any document.
    pub fn any() -> Schema {
        ANY.clone()
    }

    /// The schema for schema documents.
    pub fn meta() -> Schema {
        META.clone()
    }

    /// The schema's top-level `docs`.
    pub fn docs(&self) -> Option<&str> {
        self.inner.docs.as_deref()
    }

    /// Names of all definitions, in the order they are defined.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.inner.definitions.iter().map(|d| d.name.as_str())
    }

    /// The `docs` of a definition.
    pub fn definition_docs(&self, name: &str) -> Option<&str> {
        let id = self.inner.names.get(name)?;
        self.definition(*id).docs.as_deref()
    }

    /// Validate a document against the schema.
    ///
    /// Never fails: problems with the document, including any that stop
    /// it from being read, are reported as errors in the result.
    pub fn validate(&self, input: &[u8]) -> ValidationResult {
        crate::validate::validate(self, conl_tree::parse(input), Vec::new())
    }

    pub(crate) fn root(&self) -> MatcherId {
        self.inner.root
    }

    pub(crate) fn matcher(&self, id: MatcherId) -> &Matcher {
        &self.inner.matchers[id.0]
    }

    pub(crate) fn definition(&self, id: DefId) -> &Definition {
        &self.inner.definitions[id.0]
    }

    /// Whether a scalar with the given text satisfies the matcher.
    pub(crate) fn accepts_scalar(&self, id: MatcherId, text: &str) -> bool {
        match &self.matcher(id).kind {
            MatcherKind::Pattern { regex, .. } => regex.is_match(text),
            MatcherKind::Reference { target, .. } => match &self.definition(*target).shape {
                Shape::Scalar(m) => self.accepts_scalar(*m, text),
                Shape::OneOf(ms) => ms.iter().any(|m| self.accepts_scalar(*m, text)),
                Shape::Empty | Shape::Keys { .. } | Shape::Items { .. } => false,
            },
        }
    }
}

// =========================================================================
// Reading schema documents
// =========================================================================

#[derive(Default)]
struct Reader {
    definitions: Vec<Definition>,
    matchers: Vec<Matcher>,
    names: HashMap<String, DefId>,
}

fn set<T>(slot: &mut Option<T>, field: &Entry, value: T) -> Result<(), SchemaError> {
    if slot.replace(value).is_some() {
        return Err(SchemaError::DuplicateKey {
            line: field.line(),
            key: field.key.content.to_string(),
        });
    }
    Ok(())
}

fn map_entries<'a>(entry: &'a Entry) -> Result<&'a [Entry], SchemaError> {
    match &entry.value {
        Value::Empty => Ok(&[]),
        Value::Map(entries) => Ok(entries),
        _ => Err(SchemaError::Expected {
            line: entry.line(),
            expected: "a map",
        }),
    }
}

fn text(entry: &Entry) -> Result<String, SchemaError> {
    match &entry.value {
        Value::Scalar(token) => Ok(token.content.to_string()),
        _ => Err(SchemaError::Expected {
            line: entry.line(),
            expected: "a scalar",
        }),
    }
}

impl Reader {
    fn read(mut self, document: &Document) -> Result<Inner, SchemaError> {
        let entries = match &document.root {
            Value::Empty => return Err(SchemaError::MissingRoot),
            Value::Map(entries) => entries,
            other => {
                return Err(SchemaError::Expected {
                    line: other.line().unwrap_or(1),
                    expected: "a map",
                });
            }
        };

        let mut root = None;
        let mut docs = None;
        let mut definitions = None;
        for entry in entries {
            let slot = match entry.key.content.as_ref() {
                "root" => &mut root,
                "docs" => &mut docs,
                "definitions" => &mut definitions,
                key => {
                    return Err(SchemaError::UnexpectedKey {
                        line: entry.line(),
                        key: key.to_string(),
                    });
                }
            };
            set(slot, entry, entry)?;
        }

        let root = root.ok_or(SchemaError::MissingRoot)?;
        let docs = docs.map(text).transpose()?;
        let definitions = definitions.map(map_entries).transpose()?.unwrap_or(&[]);

        // Register every name first so references can point forwards.
        for entry in definitions {
            let name = entry.key.content.to_string();
            if self.names.contains_key(&name) {
                return Err(SchemaError::DuplicateDefinition {
                    line: entry.line(),
                    name,
                });
            }
            self.names
                .insert(name.clone(), DefId(self.definitions.len()));
            self.definitions.push(Definition {
                name,
                docs: None,
                shape: Shape::Empty,
            });
        }
        for (i, entry) in definitions.iter().enumerate() {
            let (docs, shape) = self.definition(entry)?;
            self.definitions[i].docs = docs;
            self.definitions[i].shape = shape;
        }

        let root = self.value_matcher(root)?;
        Ok(Inner {
            docs,
            root,
            definitions: self.definitions,
            matchers: self.matchers,
            names: self.names,
        })
    }

    fn definition(&mut self, entry: &Entry) -> Result<(Option<String>, Shape), SchemaError> {
        let fields = match &entry.value {
            Value::Empty => return Ok((None, Shape::Empty)),
            Value::Map(fields) => fields,
            _ => {
                return Err(SchemaError::Expected {
                    line: entry.line(),
                    expected: "a map",
                });
            }
        };

        let mut docs = None;
        let mut scalar = None;
        let mut one_of = None;
        let mut keys = None;
        let mut required_keys = None;
        let mut items = None;
        let mut required_items = None;
        for field in fields {
            match field.key.content.as_ref() {
                "docs" => set(&mut docs, field, text(field)?)?,
                "scalar" => set(&mut scalar, field, self.value_matcher(field)?)?,
                "one of" => set(&mut one_of, field, self.matcher_list(field)?)?,
                "keys" => set(&mut keys, field, self.matcher_map(field)?)?,
                "required keys" => set(&mut required_keys, field, self.matcher_map(field)?)?,
                "items" => set(&mut items, field, self.value_matcher(field)?)?,
                "required items" => set(&mut required_items, field, self.matcher_list(field)?)?,
                key => {
                    return Err(SchemaError::UnexpectedKey {
                        line: field.line(),
                        key: key.to_string(),
                    });
                }
            }
        }

        let has_keys = keys.is_some() || required_keys.is_some();
        let has_items = items.is_some() || required_items.is_some();
        let shapes = [scalar.is_some(), one_of.is_some(), has_keys, has_items];
        if shapes.iter().filter(|s| **s).count() > 1 {
            return Err(SchemaError::MultipleShapes {
                line: entry.line(),
                name: entry.key.content.to_string(),
            });
        }

        let shape = if let Some(m) = scalar {
            Shape::Scalar(m)
        } else if let Some(ms) = one_of {
            Shape::OneOf(ms)
        } else if has_keys {
            Shape::Keys {
                keys: keys.unwrap_or_default(),
                required: required_keys.unwrap_or_default(),
            }
        } else if has_items {
            Shape::Items {
                items,
                required: required_items.unwrap_or_default(),
            }
        } else {
            Shape::Empty
        };
        Ok((docs, shape))
    }

    /// A matcher given as the value of an entry: either matcher text, or a
    /// map with `matches` and `docs`.
    fn value_matcher(&mut self, entry: &Entry) -> Result<MatcherId, SchemaError> {
        match &entry.value {
            Value::Scalar(token) => self.matcher(&token.content, token.line, None),
            Value::Map(fields) => {
                let mut matches = None;
                let mut docs = None;
                for field in fields {
                    match field.key.content.as_ref() {
                        "matches" => set(&mut matches, field, field)?,
                        "docs" => set(&mut docs, field, text(field)?)?,
                        key => {
                            return Err(SchemaError::UnexpectedKey {
                                line: field.line(),
                                key: key.to_string(),
                            });
                        }
                    }
                }
                let matches = matches.ok_or(SchemaError::MissingKey {
                    line: entry.line(),
                    key: "matches",
                })?;
                let raw = text(matches)?;
                self.matcher(&raw, matches.line(), docs)
            }
            _ => Err(SchemaError::Expected {
                line: entry.line(),
                expected: "a matcher",
            }),
        }
    }

    fn matcher_list(&mut self, entry: &Entry) -> Result<Vec<MatcherId>, SchemaError> {
        match &entry.value {
            Value::List(items) => items.iter().map(|item| self.value_matcher(item)).collect(),
            _ => Err(SchemaError::Expected {
                line: entry.line(),
                expected: "a list",
            }),
        }
    }

    fn matcher_map(
        &mut self,
        entry: &Entry,
    ) -> Result<Vec<(MatcherId, MatcherId)>, SchemaError> {
        map_entries(entry)?
            .iter()
            .map(|field| {
                let key = self.matcher(&field.key.content, field.line(), None)?;
                let value = self.value_matcher(field)?;
                Ok((key, value))
            })
            .collect()
    }

    fn matcher(
        &mut self,
        text: &str,
        line: usize,
        docs: Option<String>,
    ) -> Result<MatcherId, SchemaError> {
        let kind = match text.strip_prefix('<') {
            Some(rest) => {
                let name = rest
                    .strip_suffix('>')
                    .ok_or(SchemaError::UnclosedReference { line })?;
                let target = *self
                    .names
                    .get(name)
                    .ok_or_else(|| SchemaError::Undefined {
                        line,
                        name: name.to_string(),
                    })?;
                MatcherKind::Reference {
                    name: name.to_string(),
                    target,
                }
            }
            None => {
                let invalid = |e: regex::Error| SchemaError::InvalidPattern {
                    line,
                    pattern: text.to_string(),
                    message: e.to_string(),
                };
                // Must compile alone, or a stray `)` could close the anchoring group.
                Regex::new(text).map_err(invalid)?;
                let regex = Regex::new(&format!("^(?s:{})$", text)).map_err(invalid)?;
                MatcherKind::Pattern {
                    raw: text.to_string(),
                    regex,
                }
            }
        };
        crate::trace!(line, text, "matcher");
        let id = MatcherId(self.matchers.len());
        self.matchers.push(Matcher { kind, docs, line });
        Ok(id)
    }
}

// =========================================================================
// Reference cycles
// =========================================================================

/// Reject definitions that can reach themselves through `scalar` and
/// `one of` references alone. References under keys or items consume a level
/// of the document, so they may recurse.
fn check_cycles(inner: &Inner) -> Result<(), SchemaError> {
    let mut checked = vec![false; inner.definitions.len()];
    let mut path = Vec::new();
    for id in 0..inner.definitions.len() {
        visit(inner, DefId(id), &mut path, &mut checked)?;
    }
    Ok(())
}

fn visit(
    inner: &Inner,
    id: DefId,
    path: &mut Vec<DefId>,
    checked: &mut [bool],
) -> Result<(), SchemaError> {
    if checked[id.0] {
        return Ok(());
    }
    path.push(id);
    let matchers: &[MatcherId] = match &inner.definitions[id.0].shape {
        Shape::Scalar(m) => std::slice::from_ref(m),
        Shape::OneOf(ms) => ms,
        Shape::Empty | Shape::Keys { .. } | Shape::Items { .. } => &[],
    };
    for m in matchers {
        let matcher = &inner.matchers[m.0];
        if let MatcherKind::Reference { name, target } = &matcher.kind {
            if path.contains(target) {
                return Err(SchemaError::Cycle {
                    line: matcher.line,
                    name: name.clone(),
                });
            }
            visit(inner, *target, path, checked)?;
        }
    }
    path.pop();
    checked[id.0] = true;
    Ok(())
}
