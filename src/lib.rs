#![warn(missing_docs)]
//! # The ProseMirror API
//!
//! This crate is a re-implementation of the [ProseMirror](https://prosemirror.net) document
//! model in Rust. Documents are persistent trees validated against a schema that is compiled
//! at runtime; every edit produces a new document and leaves the old one untouched.
//!
//! - [`model`]: schemas, content expressions, nodes, fragments, positions and the replace
//!   engine
//! - [`transform`]: steps that apply changes to a document
//! - [`schema_basic`]: a ready-made schema with builders for tests

pub use prosemirror_model as model;
pub use prosemirror_schema_basic as schema_basic;
pub use prosemirror_transform as transform;
