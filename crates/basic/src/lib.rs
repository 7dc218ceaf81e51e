//! # The basic schema
//!
//! A schema with the common block and inline nodes of a text document,
//! modelled on `prosemirror-schema-basic` and `prosemirror-schema-list`,
//! plus [builders](helper) to create documents in tests.
mod attrs;
mod de;
pub mod helper;

pub use attrs::{
    from_attrs, to_attrs, CodeBlockAttrs, HeadingAttrs, ImageAttrs, LinkAttrs, OrderedListAttrs,
};

use prosemirror_model::{AttrSpec, MarkSpec, NodeSpec, Schema, SchemaSpec};
use serde_json::Value;
use std::sync::OnceLock;

/// The description of the basic schema
pub fn spec() -> SchemaSpec {
    SchemaSpec {
        nodes: vec![
            NodeSpec::new("doc").content("block+"),
            NodeSpec::new("paragraph").content("inline[_]*").group("block"),
            NodeSpec::new("blockquote").content("block+").group("block"),
            NodeSpec::new("horizontal_rule").group("block"),
            NodeSpec::new("heading")
                .content("inline[_]*")
                .group("block")
                .attr("level", AttrSpec::with_default(1)),
            NodeSpec::new("code_block")
                .content("text*")
                .group("block")
                .attr("params", AttrSpec::with_default("")),
            NodeSpec::new("ordered_list")
                .content("list_item+")
                .group("block")
                .attr("order", AttrSpec::with_default(1)),
            NodeSpec::new("bullet_list").content("list_item+").group("block"),
            NodeSpec::new("list_item").content("paragraph block*"),
            NodeSpec::new("text").group("inline"),
            NodeSpec::new("image")
                .inline()
                .group("inline")
                .attr("src", AttrSpec::required())
                .attr("alt", AttrSpec::with_default(Value::Null))
                .attr("title", AttrSpec::with_default(Value::Null)),
            NodeSpec::new("hard_break").inline().group("inline"),
        ],
        marks: vec![
            MarkSpec::new("link")
                .attr("href", AttrSpec::required())
                .attr("title", AttrSpec::with_default(Value::Null)),
            MarkSpec::new("em"),
            MarkSpec::new("strong"),
            MarkSpec::new("code"),
        ],
        top_node: None,
    }
}

/// The basic schema, compiled on first use
pub fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::new(spec()).expect("the basic schema is valid"))
}
