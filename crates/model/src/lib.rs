//! # The document model
//!
//! A schema compiled at runtime from a [`SchemaSpec`], persistent documents
//! built from [`Node`]s and [`Fragment`]s, positions resolved against them
//! and the replace engine that produces new, valid documents from
//! [`Slice`]s.
mod content;
mod de;
mod fragment;
mod json;
mod marks;
mod node;
mod parse;
mod replace;
mod resolved_pos;
mod schema;
mod util;

pub use content::{ContentElement, ContentExpr, Count, MarkRule, MatchPos, SyntaxError};
pub use fragment::{Fragment, IndexError, Side};
pub use json::JsonError;
pub use marks::{Mark, MarkSet};
pub use node::{Node, Text};
pub use replace::{InsertError, ReplaceError, SliceError, Slice};
pub use resolved_pos::{Index, NodeRange, ResolveErr, ResolvedNode, ResolvedPos};
pub use schema::{
    AttrSpec, Attrs, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaError, SchemaSpec,
};
