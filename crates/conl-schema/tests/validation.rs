use conl_schema::{ANY_SCHEMA_SOURCE, META_SCHEMA_SOURCE, Schema};
use facet_testhelpers::test;

fn errors(schema: &str, input: &str) -> String {
    let schema = Schema::parse(schema.as_bytes()).unwrap();
    schema
        .validate(input.as_bytes())
        .errors()
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

const BOOL: &str = "
  bool
    one of
      = true
      = false
";

#[test]
fn test_value_must_match_pattern() {
    let schema = "root = <root>\ndefinitions\n  root\n    keys\n      username = \\w+\n";
    insta::assert_snapshot!(errors(schema, "username = *"), @r"1: expected \w+");
    assert_eq!(errors(schema, "username = alice"), "");
}

#[test]
fn test_unexpected_and_missing_keys() {
    let schema = "root = <root>\ndefinitions\n  root\n    required keys\n      username = \\w+\n";
    insta::assert_snapshot!(errors(schema, "password = example"), @r"
    1: unexpected key password
    1: missing required key username
    ");
    insta::assert_snapshot!(errors(schema, ""), @"1: missing required key username");
}

#[test]
fn test_one_of_lists_alternatives() {
    let schema = format!("root = <root>\ndefinitions\n  root\n    items = <bool>{}", BOOL);
    insta::assert_snapshot!(errors(&schema, "= true\n= false\n= foo"), @"3: expected false or true");
}

#[test]
fn test_two_keys_for_one_required_matcher() {
    let schema = "root = <root>\ndefinitions\n  root\n    required keys\n      a|b = .*\n";
    insta::assert_snapshot!(errors(schema, "a = 1\nb = 2"), @"2: duplicate key a|b");
    insta::assert_snapshot!(errors(schema, "b = 2"), @"");
    insta::assert_snapshot!(errors(schema, "c = 2"), @r"
    1: unexpected key c
    1: missing required key a or b
    ");
}

#[test]
fn test_repeated_key() {
    let schema = "root = <root>\ndefinitions\n  root\n    keys\n      a = .*\n";
    insta::assert_snapshot!(errors(schema, "a = 1\na = 2"), @"2: duplicate key a");
    insta::assert_snapshot!(errors(schema, "\"a = b\" = 1"), @r#"1: unexpected key "a = b""#);
}

#[test]
fn test_wrong_shapes() {
    let schema = "root = <root>\ndefinitions
  root
    keys
      server = <server>
      port = \\d+
      name = <name>
      verbose = <flag>
  server
    keys
      host = .+
  name
    scalar = .+
  flag
";
    insta::assert_snapshot!(errors(schema, "= a"), @"1: expected a map");
    insta::assert_snapshot!(errors(schema, "server = localhost"), @"1: expected a map");
    insta::assert_snapshot!(errors(schema, "port\n  a = 1"), @"1: expected any scalar");
    insta::assert_snapshot!(errors(schema, "name\n  = x"), @"1: expected any scalar");
    insta::assert_snapshot!(errors(schema, "verbose = yes"), @"1: expected no value");
    insta::assert_snapshot!(errors(schema, "verbose\nserver\nname = x"), @"");
}

#[test]
fn test_required_items() {
    let schema = "root = <root>\ndefinitions\n  root\n    required items\n      = first\n      = second\n";
    insta::assert_snapshot!(errors(schema, "= first"), @"1: missing required list item second");
    insta::assert_snapshot!(errors(schema, "= first\n= second"), @"");
    insta::assert_snapshot!(errors(schema, "= first\n= second\n= third"), @"3: unexpected list item");
    insta::assert_snapshot!(errors(schema, "= second\n= second"), @"1: expected first");

    let schema = "root = <root>\ndefinitions\n  root\n    required items\n      = first\n    items = \\d+\n";
    insta::assert_snapshot!(errors(schema, "= first\n= 1\n= x"), @r"3: expected \d+");
}

#[test]
fn test_one_of_prefers_the_branch_that_got_further() {
    let schema = "root = <root>\ndefinitions
  root
    one of
      = <settings>
      = <values>
  settings
    keys
      mode = fast|slow
  values
    items = .*
";
    insta::assert_snapshot!(errors(schema, "mode = medium"), @"1: expected fast or slow");
    insta::assert_snapshot!(errors(schema, "= medium"), @"");
}

#[test]
fn test_recursive_definitions() {
    let schema = "root = <tree>\ndefinitions
  tree
    keys
      leaf = \\d+
      .+ = <tree>
";
    insta::assert_snapshot!(errors(schema, "a\n  b\n    leaf = 1\n    c\n      leaf = x"), @r"5: expected \d+");
}

#[test]
fn test_decode_errors_are_reported_everywhere() {
    let schema = "root = <root>\ndefinitions\n  root\n    keys\n      a = .*\n";
    insta::assert_snapshot!(errors(schema, "a = \"x"), @"1: unclosed quotes");
    insta::assert_snapshot!(errors(schema, "b\n  c = \"x"), @r"
    1: unexpected key b
    2: unclosed quotes
    ");
    insta::assert_snapshot!(errors(schema, "a = \"\\q\"\n\"k\"x = 1"), @r"
    1: invalid escape code: \q
    2: characters after quotes
    ");
}

#[test]
fn test_list_marker_errors_skip_the_item() {
    let schema = "root = <root>\ndefinitions\n  root\n    items = \\d+\n";
    insta::assert_snapshot!(errors(schema, "= 1\n  = 2"), @"2: unexpected indent");
    let schema = "root = <root>\ndefinitions\n  root\n    keys\n      a = .*\n";
    insta::assert_snapshot!(errors(schema, "a = 1\n  b = 2"), @"2: unexpected indent");
}

#[test]
fn test_no_value_is_not_a_scalar() {
    let schema = "root = <root>\ndefinitions
  root
    keys
      name = .*
      user = \\w+
      nick = <nick>
  nick
    scalar = .*
";
    insta::assert_snapshot!(errors(schema, "name"), @"1: expected any scalar");
    insta::assert_snapshot!(errors(schema, "user ="), @"1: expected any scalar");
    insta::assert_snapshot!(errors(schema, "nick"), @"1: expected any scalar");
    insta::assert_snapshot!(errors(schema, "name = \"\""), @"");
    assert!(Schema::any().validate(b"a\nb =").is_valid());
}

#[test]
fn test_multiline_values() {
    let schema = "root = <root>\ndefinitions\n  root\n    keys\n      script = .+\n      name = \\w+\n";
    insta::assert_snapshot!(errors(schema, "script = \"\"\"sh\n  echo 1\n  echo 2\nname = x"), @"");
    insta::assert_snapshot!(errors(schema, "name = \"\"\"\n  two\n  lines"), @r"1: expected \w+");
}

#[test]
fn test_schema_docs() {
    let schema = Schema::parse(b"docs = settings for the demo\nroot = .*").unwrap();
    assert_eq!(schema.docs(), Some("settings for the demo"));
}

#[test]
fn test_any_schema() {
    let any = Schema::any();
    assert!(any.validate(b"").is_valid());
    assert!(any.validate(b"a = 1\nb\n  = x\n  =\n    c").is_valid());
    assert!(any.validate(META_SCHEMA_SOURCE.as_bytes()).is_valid());
    assert!(any.validate(ANY_SCHEMA_SOURCE.as_bytes()).is_valid());
    assert!(!any.validate(b"a = \"").is_valid());
}

#[test]
fn test_meta_schema() {
    let meta = Schema::meta();
    let messages = |input: &str| -> Vec<String> {
        meta.validate(input.as_bytes())
            .errors()
            .iter()
            .map(|e| e.to_string())
            .collect()
    };
    assert_eq!(messages(META_SCHEMA_SOURCE), Vec::<String>::new());
    assert_eq!(messages(ANY_SCHEMA_SOURCE), Vec::<String>::new());
    assert_eq!(
        messages("root = <a>\ndefinitions\n  a\n    pattern = x"),
        vec!["4: unexpected key pattern"]
    );
    assert_eq!(messages("docs = x"), vec!["1: missing required key root"]);
    assert_eq!(
        messages("root\n  docs = x"),
        vec!["1: missing required key matches"]
    );
}

#[test]
fn test_render() {
    let schema = Schema::parse(b"root = <root>\ndefinitions\n  root\n    keys\n      port = \\d+").unwrap();
    let source = "port = http\n";
    let result = schema.validate(source.as_bytes());
    let rendered = result.render("server.conl", source);
    let plain = String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap();
    assert!(plain.contains(r"expected \d+"));
    assert!(plain.contains("server.conl"));
}

mod proptests {
    use conl_schema::Schema;
    use proptest::prelude::*;

    const SCHEMA: &str = "root = <root>\ndefinitions
  root
    required keys
      name = \\w+
    keys
      mode = fast|slow
      tags = <tags>
      nested = <root>
  tags
    items = [a-z]+
";

    fn line() -> impl Strategy<Value = String> {
        let indent = prop::sample::select(vec!["", "  ", "    "]);
        let body = prop::sample::select(vec![
            "name = x",
            "name = *",
            "mode = fast",
            "mode = medium",
            "tags",
            "= a",
            "= 1",
            "nested",
            "other = \"",
            "; note",
            "",
        ]);
        (indent, body).prop_map(|(indent, body)| format!("{}{}", indent, body))
    }

    proptest! {
        #[test]
        fn validation_is_deterministic(lines in prop::collection::vec(line(), 0..12)) {
            let schema = Schema::parse(SCHEMA.as_bytes()).unwrap();
            let input = lines.join("\n");
            let first = schema.validate(input.as_bytes());
            let second = schema.validate(input.as_bytes());
            prop_assert_eq!(first.errors(), second.errors());
        }

        #[test]
        fn errors_are_in_line_order(lines in prop::collection::vec(line(), 0..12)) {
            let schema = Schema::parse(SCHEMA.as_bytes()).unwrap();
            let input = lines.join("\n");
            let result = schema.validate(input.as_bytes());
            let errors = result.errors();
            prop_assert!(errors.windows(2).all(|w| w[0].line() <= w[1].line()));
        }

        #[test]
        fn decode_errors_always_invalidate(lines in prop::collection::vec(line(), 0..12)) {
            let input = lines.join("\n");
            let document = conl_tree::parse(input.as_bytes());
            let result = Schema::any().validate(input.as_bytes());
            if !document.is_valid() {
                prop_assert!(!result.is_valid());
            }
        }
    }
}
