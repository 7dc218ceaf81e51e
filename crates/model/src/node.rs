use crate::fragment::{IndexError, Side};
use crate::replace::{self, ReplaceError, Slice, SliceError};
use crate::resolved_pos::{ResolveErr, ResolvedPos};
use crate::{util, Attrs, Fragment, MarkSet, NodeType, SchemaError};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

/// A string that stores its length in utf-16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    len_utf16: usize,
    content: String,
}

impl Text {
    /// Return the contained string
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// The length of this string if it were encoded in utf-16
    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    /// Concatenate two texts
    pub fn join(&self, other: &Self) -> Self {
        Text {
            len_utf16: self.len_utf16 + other.len_utf16,
            content: self.content.clone() + &other.content,
        }
    }
}

impl From<String> for Text {
    fn from(src: String) -> Text {
        Text {
            len_utf16: src.encode_utf16().count(),
            content: src,
        }
    }
}

impl Serialize for Text {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.content.serialize(serializer)
    }
}

#[derive(Clone, PartialEq, Eq)]
enum Body {
    Content(Fragment),
    Text(Text),
    Atom,
}

struct NodeData {
    r#type: NodeType,
    attrs: Attrs,
    marks: MarkSet,
    body: Body,
}

/// This class represents a node in the tree that makes up a ProseMirror document. So a document is
/// an instance of Node, with children that are also instances of Node.
///
/// Nodes are immutable and share their data, so cloning is cheap.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn new_branch(
        r#type: NodeType,
        attrs: Attrs,
        content: Fragment,
        marks: MarkSet,
    ) -> Self {
        Node(Arc::new(NodeData {
            r#type,
            attrs,
            marks,
            body: Body::Content(content),
        }))
    }

    pub(crate) fn new_atom(r#type: NodeType, attrs: Attrs, marks: MarkSet) -> Self {
        Node(Arc::new(NodeData {
            r#type,
            attrs,
            marks,
            body: Body::Atom,
        }))
    }

    pub(crate) fn new_text(r#type: NodeType, text: Text, marks: MarkSet) -> Self {
        Node(Arc::new(NodeData {
            r#type,
            attrs: Attrs::new(),
            marks,
            body: Body::Text(text),
        }))
    }

    /// The type of node that this is.
    pub fn r#type(&self) -> &NodeType {
        &self.0.r#type
    }

    /// The attributes of this node
    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    /// The marks (things like whether it is emphasized or part of a link) applied to this node.
    pub fn marks(&self) -> &MarkSet {
        &self.0.marks
    }

    /// A container holding the node's children. Empty for leaf nodes.
    pub fn content(&self) -> &Fragment {
        match &self.0.body {
            Body::Content(c) => c,
            _ => Fragment::EMPTY_REF,
        }
    }

    /// Get the text if this is a text node
    pub fn text_node(&self) -> Option<&Text> {
        match &self.0.body {
            Body::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The text of a text node
    pub fn text(&self) -> Option<&str> {
        self.text_node().map(Text::as_str)
    }

    /// True when both are the same node in memory.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True when this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.0.body, Body::Text(_))
    }

    /// True when this is an inline node (a text node or a node that can appear among text).
    pub fn is_inline(&self) -> bool {
        self.r#type().is_inline()
    }

    /// True when this is a block (non-inline node)
    pub fn is_block(&self) -> bool {
        self.r#type().is_block()
    }

    /// True when this is a textblock node, a block node with inline content.
    pub fn is_textblock(&self) -> bool {
        self.r#type().is_textblock()
    }

    /// True when this is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.r#type().is_leaf()
    }

    /// True when this is an atom, i.e. when it does not have directly editable content.
    pub fn is_atom(&self) -> bool {
        self.r#type().is_atom()
    }

    /// Get the child node at the given index. Raises an error when the index is out of range.
    pub fn child(&self, index: usize) -> Result<&Node, IndexError> {
        self.content().child(index)
    }

    /// Get the child node at the given index, if it exists.
    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content().maybe_child(index)
    }

    /// The number of children that the node has.
    pub fn child_count(&self) -> usize {
        self.content().child_count()
    }

    /// The first child, if any
    pub fn first_child(&self) -> Option<&Node> {
        self.content().first_child()
    }

    /// The last child, if any
    pub fn last_child(&self) -> Option<&Node> {
        self.content().last_child()
    }

    /// The size of this node, as defined by the integer-based indexing scheme. For text nodes,
    /// this is the amount of characters. For other leaf nodes, it is one. For non-leaf nodes, it
    /// is the size of the content plus two (the start and end token).
    pub fn node_size(&self) -> usize {
        match &self.0.body {
            Body::Content(c) => c.size() + 2,
            Body::Text(t) => t.len_utf16(),
            Body::Atom => 1,
        }
    }

    /// Represents `.content.size` in JS
    pub fn content_size(&self) -> usize {
        self.content().size()
    }

    /// Compare the markup (type, attributes, and marks) of this node to those of another. Returns
    /// `true` if both have the same markup.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.r#type(), other.attrs(), other.marks())
    }

    /// Check whether this node's markup correspond to the given type, attributes, and marks.
    pub fn has_markup(&self, r#type: &NodeType, attrs: &Attrs, marks: &MarkSet) -> bool {
        self.r#type() == r#type && self.attrs() == attrs && self.marks() == marks
    }

    /// Create a new node with the same markup as this node, containing the given content. Leaf
    /// nodes are returned as they are.
    pub fn copy<F>(&self, map: F) -> Node
    where
        F: FnOnce(&Fragment) -> Fragment,
    {
        match &self.0.body {
            Body::Content(c) => Node::new_branch(
                self.r#type().clone(),
                self.attrs().clone(),
                map(c),
                self.marks().clone(),
            ),
            _ => self.clone(),
        }
    }

    /// Create a copy of this node, with the given set of marks instead of the node's own marks.
    pub fn mark(&self, marks: MarkSet) -> Node {
        if &marks == self.marks() {
            return self.clone();
        }
        Node(Arc::new(NodeData {
            r#type: self.r#type().clone(),
            attrs: self.attrs().clone(),
            marks,
            body: self.0.body.clone(),
        }))
    }

    pub(crate) fn with_text(&self, text: Text) -> Node {
        Node::new_text(self.r#type().clone(), text, self.marks().clone())
    }

    /// Merge two adjacent text nodes with the same marks.
    pub(crate) fn join_text(&self, other: &Node) -> Option<Node> {
        match (self.text_node(), other.text_node()) {
            (Some(a), Some(b)) if self.same_markup(other) => Some(self.with_text(a.join(b))),
            _ => None,
        }
    }

    /// Create a copy of this node with only the content between the given positions.
    pub fn cut<R: RangeBounds<usize>>(&self, range: R) -> Cow<'_, Node> {
        if let Some(text) = self.text_node() {
            let len = text.len_utf16();
            let (from, to) = util::bounds(&range, len);
            let to = to.min(len);

            if from == 0 && to == len {
                return Cow::Borrowed(self);
            }
            let rest = util::slice_utf16(text.as_str(), from, to);
            Cow::Owned(self.with_text(Text::from(rest.to_owned())))
        } else {
            let content_size = self.content_size();
            let (from, to) = util::bounds(&range, content_size);

            if from == 0 && to == content_size {
                Cow::Borrowed(self)
            } else {
                Cow::Owned(self.copy(|c| c.cut(from..to)))
            }
        }
    }

    /// Concatenates all the text nodes found in this fragment and its children.
    pub fn text_content(&self) -> String {
        match self.text() {
            Some(text) => text.to_owned(),
            None => self
                .content()
                .text_between(0, self.content_size(), Some(""), None),
        }
    }

    /// Invoke a callback for all descendant nodes recursively between the given two positions
    /// that are relative to start of this node's content. The callback gets the node, its
    /// position, its parent and its index in the parent. When the callback returns false for a
    /// given node, that node's children will not be recursed over.
    pub fn nodes_between<R, F>(&self, range: R, mut f: F)
    where
        R: RangeBounds<usize>,
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let (from, to) = util::bounds(&range, self.content_size());
        self.content().nodes_between(from, to, &mut f, 0, Some(self))
    }

    /// Call the given callback for every descendant node.
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between(.., f)
    }

    /// Get all text between positions from and to.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: Option<&str>,
    ) -> String {
        self.content()
            .text_between(from, to, block_separator, leaf_text)
    }

    /// Resolve the given position in the document, returning a struct with information about its
    /// context.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, ResolveErr> {
        ResolvedPos::resolve(self, pos)
    }

    /// Cut out the part of the document between the given positions, and return it as a `Slice`
    /// object. With `include_parents`, the slice is opened up to the shared depth of the two
    /// positions instead of their shared parent.
    pub fn slice<R: RangeBounds<usize>>(
        &self,
        range: R,
        include_parents: bool,
    ) -> Result<Slice, SliceError> {
        let (from, to) = util::bounds(&range, self.content_size());

        if from == to {
            return Ok(Slice::default());
        }

        let rp_from = self.resolve(from)?;
        let rp_to = self.resolve(to)?;
        let depth = if include_parents {
            0
        } else {
            rp_from.shared_depth(to)
        };
        let start = rp_from.start(depth);
        let node = rp_from.node(depth);
        let content = node.content().cut(from - start..to - start);
        Ok(Slice::new(
            content,
            rp_from.depth() - depth,
            rp_to.depth() - depth,
        ))
    }

    /// Replace the part of the document between the given positions with the given slice. The
    /// slice must 'fit', meaning its open sides must be able to connect to the surrounding content,
    /// and its content nodes must be valid children for the node they are placed into. If any of
    /// this is violated, an error of type `ReplaceError` is returned.
    pub fn replace<R: RangeBounds<usize>>(
        &self,
        range: R,
        slice: &Slice,
    ) -> Result<Node, ReplaceError> {
        let (from, to) = util::bounds(&range, self.content_size());

        let rp_from = self.resolve(from)?;
        let rp_to = self.resolve(to)?;

        replace::replace(&rp_from, &rp_to, slice)
    }

    /// Test whether replacing the range between `from` and `to` (by child index) with the given
    /// replacement fragment would leave the node's content valid.
    pub fn can_replace(
        &self,
        from: usize,
        to: usize,
        replacement: &Fragment,
    ) -> Result<bool, IndexError> {
        let count = self.child_count();
        if from > to || to > count {
            return Err(IndexError::Child { index: to, count });
        }
        let content = self.content();
        let candidate = content
            .cut_by_index(..from)
            .append(replacement.clone())
            .append(content.cut_by_index(to..));
        Ok(self.r#type().valid_content(&candidate, self.attrs()))
    }

    /// Check whether this node and its descendants conform to the schema, and return an error
    /// when they do not.
    pub fn check(&self) -> Result<(), SchemaError> {
        if !self.r#type().valid_content(self.content(), self.attrs()) {
            return Err(SchemaError::InvalidContent(self.r#type().name().to_owned()));
        }
        for child in self.content().iter() {
            child.check()?;
        }
        Ok(())
    }

    /// Close this node on the given side: complete its content so that it is valid, `depth`
    /// levels down along that side first.
    pub fn close(&self, depth: usize, side: Side) -> Result<Node, ReplaceError> {
        if self.is_leaf() || self.is_text() {
            return Ok(self.clone());
        }
        let mut content = Cow::Borrowed(self.content());
        if depth > 0 {
            let index = match side {
                Side::Start => 0,
                Side::End => content.child_count().saturating_sub(1),
            };
            if let Some(child) = content.maybe_child(index) {
                let closed = child.close(depth - 1, side)?;
                content = Cow::Owned(content.with_child(index, closed));
            }
        }

        let attrs = self.attrs();
        let expr = self.r#type().content_expr();
        let filled = match side {
            Side::Start => expr
                .fill_two_way(attrs, Fragment::EMPTY_REF, &content)
                .map(|fill| fill.append(content.into_owned())),
            Side::End => expr
                .fill_two_way(attrs, &content, Fragment::EMPTY_REF)
                .map(|fill| content.into_owned().append(fill)),
        };
        match filled {
            Some(content) => Ok(self.copy(|_| content)),
            None => Err(ReplaceError::InvalidContent(self.r#type().name().to_owned())),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.same_markup(other) && self.0.body == other.0.body)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = self.marks().as_slice();
        for mark in marks {
            write!(f, "{}(", mark.r#type().name())?;
        }
        match &self.0.body {
            Body::Text(t) => write!(f, "{:?}", t.as_str())?,
            Body::Content(c) if c.size() > 0 => {
                write!(f, "{}(", self.r#type().name())?;
                c.fmt_inner(f)?;
                f.write_str(")")?;
            }
            _ => f.write_str(self.r#type().name())?,
        }
        for _ in marks {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.r#type().name())?;
        if !self.attrs().is_empty() {
            map.serialize_entry("attrs", self.attrs())?;
        }
        match &self.0.body {
            Body::Content(c) if c.child_count() > 0 => map.serialize_entry("content", c)?,
            Body::Text(t) => map.serialize_entry("text", t)?,
            _ => {}
        }
        if !self.marks().is_empty() {
            map.serialize_entry("marks", self.marks())?;
        }
        map.end()
    }
}
