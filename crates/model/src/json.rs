//! Reading documents, marks and slices from their JSON representation.
//!
//! Writing goes through the `Serialize` implementations of the model types.
use crate::replace::open_depth;
use crate::{Attrs, Fragment, Mark, MarkSet, Node, Schema, SchemaError, Slice};
use displaydoc::Display;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// An error when reading model values from JSON
#[derive(Debug, Display, Error)]
pub enum JsonError {
    /// Invalid JSON: {0}
    Serde(#[from] serde_json::Error),
    /// {0}
    Schema(#[from] SchemaError),
    /// Text node without text
    MissingText,
    /// Invalid open depth {open} for slice of depth {depth}
    OpenDepth {
        /// The requested open depth
        open: usize,
        /// The depth available on that side
        depth: usize,
    },
}

#[derive(Debug, Deserialize)]
struct MarkJson {
    #[serde(rename = "type")]
    r#type: String,
    #[serde(default)]
    attrs: Option<Attrs>,
}

impl MarkJson {
    fn build(self, schema: &Schema) -> Result<Mark, JsonError> {
        Ok(schema.mark(&self.r#type, self.attrs.as_ref())?)
    }
}

#[derive(Debug, Deserialize)]
struct NodeJson {
    #[serde(rename = "type")]
    r#type: String,
    #[serde(default)]
    attrs: Option<Attrs>,
    #[serde(default)]
    content: Vec<NodeJson>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    marks: Vec<MarkJson>,
}

impl NodeJson {
    fn build(self, schema: &Schema) -> Result<Node, JsonError> {
        let node_type = schema
            .node_type(&self.r#type)
            .ok_or_else(|| SchemaError::UnknownNode(self.r#type.clone()))?;
        let marks = self
            .marks
            .into_iter()
            .map(|m| m.build(schema))
            .collect::<Result<Vec<_>, _>>()?;
        let marks = MarkSet::from_marks(marks);
        if node_type.is_text() {
            let text = self.text.ok_or(JsonError::MissingText)?;
            return Ok(schema.text(text, marks)?);
        }
        let content = build_fragment(schema, self.content)?;
        Ok(node_type.create(self.attrs.as_ref(), content, marks)?)
    }
}

fn build_fragment(schema: &Schema, nodes: Vec<NodeJson>) -> Result<Fragment, JsonError> {
    nodes
        .into_iter()
        .map(|n| n.build(schema))
        .collect::<Result<Vec<_>, _>>()
        .map(Fragment::from)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SliceJson {
    #[serde(default)]
    content: Vec<NodeJson>,
    #[serde(default, alias = "openLeft")]
    open_start: usize,
    #[serde(default, alias = "openRight")]
    open_end: usize,
}

impl Node {
    /// Deserialize a node from its JSON representation. The content of the
    /// node is not checked against the schema, use [`Node::check`] for that.
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Node, JsonError> {
        NodeJson::deserialize(value)?.build(schema)
    }

    /// The JSON representation of this node
    pub fn to_json(&self) -> Result<Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Fragment {
    /// Deserialize a fragment from a JSON array of nodes (or `null`).
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Fragment, JsonError> {
        let nodes = Option::<Vec<NodeJson>>::deserialize(value)?.unwrap_or_default();
        build_fragment(schema, nodes)
    }

    /// The JSON representation of this fragment
    pub fn to_json(&self) -> Result<Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Mark {
    /// Deserialize a mark from its JSON representation
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Mark, JsonError> {
        MarkJson::deserialize(value)?.build(schema)
    }

    /// The JSON representation of this mark
    pub fn to_json(&self) -> Result<Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Slice {
    /// Deserialize a slice from its JSON representation (or `null` for the
    /// empty slice). Both `openStart`/`openEnd` and the older
    /// `openLeft`/`openRight` keys are accepted.
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Slice, JsonError> {
        let raw = Option::<SliceJson>::deserialize(value)?.unwrap_or_default();
        let content = build_fragment(schema, raw.content)?;
        let start_depth = open_depth(content.first_child(), false);
        if raw.open_start > start_depth {
            return Err(JsonError::OpenDepth {
                open: raw.open_start,
                depth: start_depth,
            });
        }
        let end_depth = open_depth(content.last_child(), true);
        if raw.open_end > end_depth {
            return Err(JsonError::OpenDepth {
                open: raw.open_end,
                depth: end_depth,
            });
        }
        Ok(Slice::new(content, raw.open_start, raw.open_end))
    }

    /// The JSON representation of this slice
    pub fn to_json(&self) -> Result<Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Schema {
    /// Deserialize a node of this schema from JSON, see [`Node::from_json`]
    pub fn node_from_json(&self, value: &Value) -> Result<Node, JsonError> {
        Node::from_json(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonError;
    use crate::schema::tests::schema;
    use crate::{Fragment, Mark, Node, Slice};
    use serde_json::json;

    #[test]
    fn reads_and_writes_nodes() {
        let schema = schema();
        let value = json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 2}, "content": [
                    {"type": "text", "text": "Title"}
                ]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "a"},
                    {"type": "text", "text": "b", "marks": [{"type": "em"}]}
                ]},
                {"type": "horizontal_rule"}
            ]
        });
        let doc = Node::from_json(&schema, &value).unwrap();
        assert_eq!(
            doc.to_string(),
            "doc(heading(\"Title\"), paragraph(\"a\", em(\"b\")), horizontal_rule)"
        );
        assert!(doc.check().is_ok());
        assert_eq!(doc.to_json().unwrap(), value);
    }

    #[test]
    fn fills_default_attrs() {
        let schema = schema();
        let node = Node::from_json(&schema, &json!({"type": "heading"})).unwrap();
        assert_eq!(node.to_json().unwrap(), json!({"type": "heading", "attrs": {"level": 1}}));
    }

    #[test]
    fn rejects_bad_input() {
        let schema = schema();
        let unknown = Node::from_json(&schema, &json!({"type": "table"}));
        assert!(matches!(unknown, Err(JsonError::Schema(_))));
        let empty = Node::from_json(&schema, &json!({"type": "text", "text": ""}));
        assert!(matches!(empty, Err(JsonError::Schema(_))));
        let no_text = Node::from_json(&schema, &json!({"type": "text"}));
        assert!(matches!(no_text, Err(JsonError::MissingText)));
        let missing = Mark::from_json(&schema, &json!({"type": "link"}));
        assert!(matches!(missing, Err(JsonError::Schema(_))));
        assert!(matches!(
            Node::from_json(&schema, &json!([1, 2])),
            Err(JsonError::Serde(_))
        ));
    }

    #[test]
    fn writes_marks() {
        let schema = schema();
        let value = json!({"type": "link", "attrs": {"href": "https://x.org"}});
        let link = Mark::from_json(&schema, &value).unwrap();
        assert_eq!(link.to_json().unwrap(), value);
        let em = Mark::from_json(&schema, &json!({"type": "em"})).unwrap();
        assert_eq!(em.to_json().unwrap(), json!({"type": "em"}));
    }

    #[test]
    fn reads_slices() {
        let schema = schema();
        let value = json!({
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "ab"}]}],
            "openStart": 1,
            "openEnd": 1
        });
        let slice = Slice::from_json(&schema, &value).unwrap();
        assert_eq!((slice.open_start, slice.open_end), (1, 1));
        assert_eq!(slice.to_json().unwrap(), value);

        let legacy = json!({
            "content": [{"type": "paragraph"}],
            "openLeft": 1
        });
        assert_eq!(Slice::from_json(&schema, &legacy).unwrap().open_start, 1);
        assert_eq!(Slice::from_json(&schema, &json!(null)).unwrap(), Slice::default());

        let too_deep = json!({"content": [{"type": "paragraph"}], "openEnd": 2});
        assert!(matches!(
            Slice::from_json(&schema, &too_deep),
            Err(JsonError::OpenDepth { open: 2, depth: 1 })
        ));
    }

    #[test]
    fn merges_text_in_fragments() {
        let schema = schema();
        let frag = Fragment::from_json(
            &schema,
            &json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]),
        )
        .unwrap();
        assert_eq!(frag.child_count(), 1);
        assert_eq!(Fragment::from_json(&schema, &json!(null)).unwrap(), Fragment::new());
    }
}
