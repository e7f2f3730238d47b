use conl_schema::{Schema, Suggestion};
use facet_testhelpers::test;

fn schema(source: &str) -> Schema {
    Schema::parse(source.as_bytes()).unwrap()
}

fn values(suggestions: &[Suggestion]) -> Vec<&str> {
    suggestions.iter().map(|s| s.value.as_str()).collect()
}

#[test]
fn test_root_keys() {
    let schema = schema("root = <root>\ndefinitions\n  root\n    keys\n      a = .*\n      b = .*\n");
    assert_eq!(values(&schema.validate(b"").suggested_keys(0)), ["a", "b"]);
    assert_eq!(values(&schema.validate(b"a = 1\n").suggested_keys(0)), ["b"]);
}

#[test]
fn test_suggestions_survive_errors() {
    let schema = schema("root = <root>\ndefinitions\n  root\n    keys\n      a = .*\n      b = .*\n");
    let result = schema.validate(b"a = 1\nzzz = 2");
    assert!(!result.is_valid());
    assert_eq!(values(&result.suggested_keys(0)), ["b"]);
}

#[test]
fn test_nested_keys() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      a = <inner>
  inner
    keys
      b = .*
      c = .*
",
    );
    let result = schema.validate(b"a\n  ");
    assert_eq!(values(&result.suggested_keys(1)), ["b", "c"]);
    let result = schema.validate(b"a\n  c = 1\n");
    assert_eq!(values(&result.suggested_keys(1)), ["b"]);
}

#[test]
fn test_keys_from_every_alternative() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      a = <either>
  either
    one of
      = <b map>
      = <c map>
  b map
    keys
      b = .*
  c map
    keys
      c = .*
",
    );
    assert_eq!(values(&schema.validate(b"a\n").suggested_keys(1)), ["b", "c"]);
}

#[test]
fn test_required_and_optional_keys() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      a = <x>
  x
    keys
      b = <wow>
  wow
    required keys
      d = .*
    keys
      e = .*
",
    );
    assert_eq!(values(&schema.validate(b"a\n  b\n").suggested_keys(2)), ["d", "e"]);
}

#[test]
fn test_literal_alternations() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      log (level|format) = .*
      color|colour = .*
      \\w+ = .*
",
    );
    assert_eq!(
        values(&schema.validate(b"").suggested_keys(0)),
        ["color", "colour"]
    );
}

#[test]
fn test_key_docs() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      a
        matches = hello
        docs = Hello!
",
    );
    assert_eq!(
        schema.validate(b"").suggested_keys(0),
        vec![Suggestion {
            value: "a".to_string(),
            docs: Some("Hello!".to_string()),
        }]
    );
}

#[test]
fn test_value_docs() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      a
        matches = a
        docs = Hello!
",
    );
    let (suggestions, nested) = schema.validate(b"a = ").suggested_values(1);
    assert_eq!(
        suggestions,
        vec![Suggestion {
            value: "a".to_string(),
            docs: Some("Hello!".to_string()),
        }]
    );
    assert!(!nested);
}

#[test]
fn test_values_from_references() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      enabled = <bool>
      name = .+
  bool
    one of
      = true
      = false
",
    );
    let result = schema.validate(b"enabled = \nname = x");
    assert_eq!(values(&result.suggested_values(1).0), ["false", "true"]);
    assert!(result.suggested_values(2).0.is_empty());
    assert!(result.suggested_values(7).0.is_empty());
}

#[test]
fn test_lists() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      list = <list>
  list
    items = .*
",
    );
    let result = schema.validate(b"list\n");
    assert_eq!(values(&result.suggested_keys(1)), ["="]);
    let (suggestions, nested) = result.suggested_values(1);
    assert!(suggestions.is_empty());
    assert!(nested);
}

#[test]
fn test_docs_lookup() {
    let schema = schema(
        "root = <root>\ndefinitions
  root
    keys
      port
        matches = <port>
        docs = port to listen on
      host = <host>
  port
    docs = a TCP port
    scalar = \\d+
  host
    docs = a host name
    scalar = .+
",
    );
    let result = schema.validate(b"port = 80\nhost = example.com\nextra = 1");
    assert_eq!(result.docs_for_key(1).as_deref(), Some("port to listen on"));
    assert_eq!(result.docs_for_value(1).as_deref(), Some("port to listen on"));
    assert_eq!(result.docs_for_key(2).as_deref(), Some("a host name"));
    assert_eq!(result.docs_for_value(2).as_deref(), Some("a host name"));
    assert_eq!(result.docs_for_key(3), None);
    assert_eq!(result.docs_for_value(3), None);
}

#[test]
fn test_meta_schema_suggestions() {
    let result = Schema::meta().validate(b"");
    let suggestions = result.suggested_keys(0);
    assert_eq!(values(&suggestions), ["definitions", "docs", "root"]);
    assert!(suggestions.iter().all(|s| s.docs.is_some()));

    let result = Schema::meta().validate(b"root = <a>\ndefinitions\n  a\n");
    assert_eq!(
        values(&result.suggested_keys(3)),
        [
            "docs",
            "items",
            "keys",
            "one of",
            "required items",
            "required keys",
            "scalar"
        ]
    );
}
