use prosemirror::model::{JsonError, Node, Slice};
use prosemirror::schema_basic::helper::{a, blockquote, doc, em, img, li, ol, p, strong, text};
use prosemirror::schema_basic::schema;
use serde_json::json;

#[test]
fn reads_a_basic_document() {
    let value = json!({
        "type": "doc",
        "content": [
            {"type": "ordered_list", "attrs": {"order": 3}, "content": [
                {"type": "list_item", "content": [
                    {"type": "paragraph", "content": [
                        {"type": "text", "text": "see "},
                        {"type": "text", "text": "here", "marks": [
                            {"type": "link", "attrs": {"href": "https://x.org", "title": null}},
                            {"type": "em"}
                        ]}
                    ]}
                ]}
            ]},
            {"type": "paragraph", "content": [
                {"type": "image", "attrs": {"src": "a.png", "alt": null, "title": null}},
                {"type": "hard_break"}
            ]}
        ]
    });
    let d = schema().node_from_json(&value).unwrap();
    assert!(d.check().is_ok());
    assert_eq!(d.to_json().unwrap(), value);
    assert_eq!(Node::from_json(schema(), &d.to_json().unwrap()).unwrap(), d);
}

#[test]
fn writes_built_documents() {
    let d = doc((p(vec![text("a"), strong("b")]), blockquote(p(""))));
    assert_eq!(
        d.to_json().unwrap(),
        json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "a"},
                    {"type": "text", "text": "b", "marks": [{"type": "strong"}]}
                ]},
                {"type": "blockquote", "content": [{"type": "paragraph"}]}
            ]
        })
    );
}

#[test]
fn round_trips_built_documents() {
    let d = doc((
        ol(2, li(p(vec![a("https://x.org", "x"), em("y")]))),
        p(img("b.png")),
    ));
    let value = d.to_json().unwrap();
    assert_eq!(Node::from_json(schema(), &value).unwrap(), d);
}

#[test]
fn reads_document_slices() {
    let d = doc((p("one"), p("two")));
    let slice = d.slice(2..7, false).unwrap();
    let value = slice.to_json().unwrap();
    assert_eq!(
        value,
        json!({
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "ne"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "t"}]}
            ],
            "openStart": 1,
            "openEnd": 1
        })
    );
    assert_eq!(Slice::from_json(schema(), &value).unwrap(), slice);

    let legacy = json!({
        "content": value["content"].clone(),
        "openLeft": 1,
        "openRight": 1
    });
    assert_eq!(Slice::from_json(schema(), &legacy).unwrap(), slice);
}

#[test]
fn reports_unknown_types() {
    let err = schema()
        .node_from_json(&json!({"type": "table"}))
        .unwrap_err();
    assert!(matches!(err, JsonError::Schema(_)));
    assert!(err.to_string().contains("table"));
}
