use prosemirror::model::{
    AttrSpec, Attrs, ContentExpr, Fragment, MarkSet, MatchPos, Node, NodeSpec, Schema,
    SchemaError, SchemaSpec,
};
use serde_json::json;

fn schema() -> Schema {
    Schema::new(SchemaSpec {
        nodes: vec![
            NodeSpec::new("doc").content("block+"),
            NodeSpec::new("paragraph").content("text*").group("block"),
            NodeSpec::new("heading").content("text*").group("block"),
            NodeSpec::new("horizontal_rule").group("block"),
            NodeSpec::new("table")
                .content("cell%@columns")
                .group("block")
                .attr("columns", AttrSpec::with_default(2)),
            NodeSpec::new("stanza")
                .content("line{@lines}")
                .group("block")
                .attr("lines", AttrSpec::with_default(3)),
            NodeSpec::new("cell").content("text*"),
            NodeSpec::new("line").content("text*"),
            NodeSpec::new("text"),
        ],
        ..SchemaSpec::default()
    })
    .unwrap()
}

fn node(schema: &Schema, name: &str) -> Node {
    schema
        .node(name, None, Fragment::new(), MarkSet::default())
        .unwrap()
}

fn names(fragment: &Fragment) -> Vec<&str> {
    fragment.iter().map(|n| n.r#type().name()).collect()
}

fn expr(schema: &Schema, on: &str, source: &str) -> ContentExpr {
    ContentExpr::parse(&schema.node_type(on).unwrap(), source).unwrap()
}

#[test]
fn matches_fixed_sequences() {
    let schema = schema();
    let e = expr(&schema, "doc", "paragraph horizontal_rule paragraph");
    let attrs = Attrs::new();
    let p = node(&schema, "paragraph");
    let hr = node(&schema, "horizontal_rule");

    let full = Fragment::from(vec![p.clone(), hr.clone(), p.clone()]);
    assert!(e.matches(&attrs, &full));
    let short = Fragment::from(vec![p, hr]);
    assert!(!e.matches(&attrs, &short));
}

#[test]
fn fills_required_elements() {
    let schema = schema();
    let e = expr(&schema, "doc", "heading+ paragraph+");
    let attrs = Attrs::new();
    let before = Fragment::from(node(&schema, "heading"));

    let fill = e.fill_two_way(&attrs, &before, &Fragment::new()).unwrap();
    assert_eq!(names(&fill), vec!["paragraph"]);
    assert!(e.matches(&attrs, &before.clone().append(fill)));

    let after = Fragment::from(node(&schema, "heading"));
    assert_eq!(e.fill_two_way(&attrs, &Fragment::from(node(&schema, "paragraph")), &after), None);
}

#[test]
fn fills_around_a_kept_middle() {
    let schema = schema();
    let e = expr(&schema, "doc", "heading paragraph horizontal_rule");
    let attrs = Attrs::new();
    let mid = Fragment::from(node(&schema, "paragraph"));

    let (left, right) = e
        .fill_three_way(&attrs, &Fragment::new(), &mid, &Fragment::new())
        .unwrap();
    assert_eq!(names(&left), vec!["heading"]);
    assert_eq!(names(&right), vec!["horizontal_rule"]);

    let stray = Fragment::from(node(&schema, "cell"));
    assert!(e
        .fill_three_way(&attrs, &Fragment::new(), &stray, &Fragment::new())
        .is_none());
}

#[test]
fn counts_from_attributes() {
    let schema = schema();
    let stanza = schema.node_type("stanza").unwrap();
    let line = node(&schema, "line");
    let two = Fragment::from(vec![line.clone(), line.clone()]);

    let mut attrs = Attrs::new();
    attrs.insert("lines".into(), json!(2));
    assert!(stanza.valid_content(&two, &attrs));
    attrs.insert("lines".into(), json!(3));
    assert!(!stanza.valid_content(&two, &attrs));

    let filled = stanza
        .create_and_fill(None, Fragment::new(), MarkSet::default())
        .unwrap();
    assert_eq!(filled.child_count(), 3);
}

#[test]
fn repeats_modulo_a_count() {
    let schema = schema();
    let table = schema.node_type("table").unwrap();
    let attrs = table.default_attrs().unwrap();
    let cell = node(&schema, "cell");
    let cells = |n: usize| Fragment::from(vec![cell.clone(); n]);

    assert!(!table.valid_content(&cells(0), &attrs));
    assert!(!table.valid_content(&cells(1), &attrs));
    assert!(table.valid_content(&cells(2), &attrs));
    assert!(!table.valid_content(&cells(3), &attrs));
    assert!(table.valid_content(&cells(4), &attrs));

    let expr = table.content_expr();
    let fill = expr.fill_two_way(&attrs, &cells(3), &Fragment::new()).unwrap();
    assert_eq!(fill.child_count(), 1);
}

#[test]
fn lists_possible_types() {
    let schema = schema();
    let e = expr(&schema, "doc", "heading? paragraph+");
    let attrs = Attrs::new();
    let types: Vec<_> = e
        .possible_types(&attrs, e.start())
        .iter()
        .map(|t| t.name().to_owned())
        .collect();
    assert_eq!(types, vec!["heading", "paragraph"]);

    let after_heading = e
        .match_forward(&attrs, &Fragment::from(node(&schema, "heading")), e.start(), None)
        .unwrap();
    assert_eq!(after_heading, MatchPos::new(0, 1));
    let types = e.possible_types(&attrs, after_heading);
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name(), "paragraph");
}

#[test]
fn matches_from_the_back() {
    let schema = schema();
    let e = expr(&schema, "doc", "heading paragraph*");
    let attrs = Attrs::new();
    let p = node(&schema, "paragraph");
    let tail = Fragment::from(vec![p.clone(), p]);
    let pos = e.match_backward(&attrs, &tail, e.end(), None).unwrap();
    assert_eq!(pos, MatchPos::new(1, 2));
}

#[test]
fn reports_syntax_errors() {
    let err = Schema::new(SchemaSpec {
        nodes: vec![
            NodeSpec::new("doc").content("paragraph+ (paragraph"),
            NodeSpec::new("paragraph"),
        ],
        ..SchemaSpec::default()
    })
    .unwrap_err();
    assert!(matches!(err, SchemaError::Syntax(_)));
    assert!(err.to_string().contains("paragraph+ (paragraph"));

    let schema = schema();
    let doc = schema.node_type("doc").unwrap();
    assert!(ContentExpr::parse(&doc, "paragraph* paragraph").is_err());
    assert!(ContentExpr::parse(&doc, "paragraph text").is_err());
    assert!(ContentExpr::parse(&doc, "paragraph{@missing}").is_err());
}
