use crate::replace::ReplaceError;
use crate::util;
use crate::{Index, Node};
use displaydoc::Display;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::iter::Rev;
use std::ops::RangeBounds;
use std::slice;
use thiserror::Error;

/// Errors on fragment indices and offsets
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Error)]
pub enum IndexError {
    /// Index {index} out of range for fragment with {count} children
    Child {
        /// The requested index
        index: usize,
        /// The number of children
        count: usize,
    },
    /// Position {pos} outside of fragment of size {size}
    Position {
        /// The requested position
        pos: usize,
        /// The size of the fragment
        size: usize,
    },
    /// Text nodes can't be swapped with `replace_child`
    TextChild,
}

/// Which side of a node is open
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    /// The start of the node
    Start,
    /// The end of the node
    End,
}

/// Inline children with the end offset of every child, for offset lookups
/// by binary search.
#[derive(Clone)]
struct TextRuns {
    nodes: Vec<Node>,
    ends: Vec<usize>,
}

#[derive(Clone)]
enum Repr {
    Flat(Vec<Node>),
    Runs(TextRuns),
}

/// A fragment represents a node's collection of child nodes.
///
/// Like nodes, fragments are persistent data structures, and you should not mutate them or their
/// content. Rather, you create new instances whenever needed. The API tries to make this easy.
#[derive(Clone)]
pub struct Fragment {
    repr: Repr,
    size: usize,
}

impl Fragment {
    /// An empty fragment
    pub const EMPTY: Self = Fragment {
        repr: Repr::Flat(Vec::new()),
        size: 0,
    };
    /// Reference to an empty fragment
    pub const EMPTY_REF: &'static Self = &Self::EMPTY;

    /// Create a new empty fragment
    pub fn new() -> Self {
        Self::EMPTY
    }

    fn from_normalized(nodes: Vec<Node>) -> Self {
        let size = nodes.iter().map(Node::node_size).sum();
        let repr = if !nodes.is_empty() && nodes.iter().all(Node::is_inline) {
            let ends = nodes
                .iter()
                .scan(0, |end, node| {
                    *end += node.node_size();
                    Some(*end)
                })
                .collect();
            Repr::Runs(TextRuns { nodes, ends })
        } else {
            Repr::Flat(nodes)
        };
        Fragment { repr, size }
    }

    /// The size of the fragment, which is the total of the size of its content nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// True when the fragment has no children
    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    /// True when this fragment uses the run-aware representation for inline content
    pub fn is_text_runs(&self) -> bool {
        matches!(self.repr, Repr::Runs(_))
    }

    /// Get a slice to all child nodes
    pub fn children(&self) -> &[Node] {
        match &self.repr {
            Repr::Flat(nodes) => nodes,
            Repr::Runs(runs) => &runs.nodes,
        }
    }

    fn into_children(self) -> Vec<Node> {
        match self.repr {
            Repr::Flat(nodes) => nodes,
            Repr::Runs(runs) => runs.nodes,
        }
    }

    /// The first child of the fragment wrapped in `Some`, or `None` if it is empty.
    pub fn first_child(&self) -> Option<&Node> {
        self.children().first()
    }

    /// The last child of the fragment wrapped in `Some`, or `None` if it is empty.
    pub fn last_child(&self) -> Option<&Node> {
        self.children().last()
    }

    /// The number of child nodes in this fragment.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Get the child node at the given index.
    pub fn child(&self, index: usize) -> Result<&Node, IndexError> {
        self.children().get(index).ok_or(IndexError::Child {
            index,
            count: self.child_count(),
        })
    }

    /// Get the child node at the given index, if it exists.
    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    /// Iterate over the children, front to back
    pub fn iter(&self) -> slice::Iter<'_, Node> {
        self.children().iter()
    }

    /// Iterate over the children, back to front
    pub fn reverse_iter(&self) -> Rev<slice::Iter<'_, Node>> {
        self.children().iter().rev()
    }

    /// Call `f` for every child node, passing the node, its offset into this
    /// fragment, and its index.
    pub fn for_each<F: FnMut(&Node, usize, usize)>(&self, mut f: F) {
        let mut pos = 0;
        for (i, child) in self.iter().enumerate() {
            f(child, pos, i);
            pos += child.node_size();
        }
    }

    /// The index of the child that ends after `pos`, and its start offset.
    /// Returns the child count and the size when `pos` is at the end.
    fn locate(&self, pos: usize) -> (usize, usize) {
        match &self.repr {
            Repr::Runs(runs) => {
                let index = runs.ends.partition_point(|&end| end <= pos);
                let start = if index == 0 { 0 } else { runs.ends[index - 1] };
                (index, start)
            }
            Repr::Flat(nodes) => {
                let mut start = 0;
                for (i, child) in nodes.iter().enumerate() {
                    let end = start + child.node_size();
                    if end > pos {
                        return (i, start);
                    }
                    start = end;
                }
                (nodes.len(), start)
            }
        }
    }

    /// Find the index and inner offset corresponding to a given relative
    /// position in this fragment. With `round`, a position inside a child
    /// is rounded up to the position after it.
    pub fn find_index(&self, pos: usize, round: bool) -> Result<Index, IndexError> {
        if pos == 0 {
            return Ok(Index::new(0, 0));
        }
        if pos == self.size {
            return Ok(Index::new(self.child_count(), pos));
        }
        if pos > self.size {
            return Err(IndexError::Position {
                pos,
                size: self.size,
            });
        }
        let (index, start) = self.locate(pos);
        if start == pos || !round {
            Ok(Index::new(index, start))
        } else {
            let end = start + self.children()[index].node_size();
            Ok(Index::new(index + 1, end))
        }
    }

    /// Create a new fragment containing the combined content of this fragment and the other.
    /// Text nodes with the same marks at the boundary are merged.
    pub fn append(self, other: Self) -> Self {
        if other.child_count() == 0 {
            return self;
        }
        if self.child_count() == 0 {
            return other;
        }
        let mut nodes = self.into_children();
        let mut rest = other.into_children().into_iter();
        if let (Some(last), Some(first)) = (nodes.last_mut(), rest.as_slice().first()) {
            if let Some(joined) = last.join_text(first) {
                *last = joined;
                rest.next();
            }
        }
        nodes.extend(rest);
        Self::from_normalized(nodes)
    }

    /// Append `other`, joining the boundary nodes when they have the same
    /// markup and both sides are open. `join_left` is the open depth of this
    /// fragment's end, `join_right` the open depth of the start of `other`.
    /// Open boundary nodes that can't be joined are closed, which fills in
    /// the content they need on their open side.
    pub fn append_open(
        &self,
        other: &Fragment,
        join_left: usize,
        join_right: usize,
    ) -> Result<Fragment, ReplaceError> {
        let mut nodes = self.children().to_vec();
        let mut rest = other.children().iter();
        let first = rest.next();

        let last = nodes.pop();
        match (last, first) {
            (None, None) => {}
            (Some(last), None) => nodes.push(close_at(last, join_left, Side::End)?),
            (None, Some(first)) => nodes.push(close_at(first.clone(), join_right, Side::Start)?),
            (Some(last), Some(first)) => {
                if let Some(joined) = last.join_text(first) {
                    nodes.push(joined);
                } else if join_left > 0 && join_right > 0 && last.same_markup(first) {
                    let content = last.content().append_open(
                        first.content(),
                        join_left - 1,
                        join_right - 1,
                    )?;
                    nodes.push(last.copy(|_| content));
                } else {
                    nodes.push(close_at(last, join_left, Side::End)?);
                    nodes.push(close_at(first.clone(), join_right, Side::Start)?);
                }
            }
        }
        nodes.extend(rest.cloned());
        Ok(Self::from_normalized(nodes))
    }

    /// Cut out the sub-fragment between the two given positions.
    pub fn cut<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let (from, to) = util::bounds(&range, self.size);

        if from == 0 && to == self.size {
            return self.clone();
        }

        let mut result = vec![];
        if to > from {
            let (mut i, mut pos) = self.locate(from);
            let children = self.children();
            while pos < to && i < children.len() {
                let child = &children[i];
                let end = pos + child.node_size();
                let new_child = if pos < from || end > to {
                    if child.is_text() {
                        child.cut(from.saturating_sub(pos)..usize::min(child.node_size(), to - pos))
                    } else {
                        let t = pos + 1;
                        child.cut(from.saturating_sub(t)..usize::min(child.content_size(), to - t))
                    }
                    .into_owned()
                } else {
                    child.clone()
                };
                if !matches!(new_child.text(), Some("")) {
                    result.push(new_child);
                }
                pos = end;
                i += 1;
            }
        }
        Self::from_normalized(result)
    }

    /// Create a new fragment with the children between the given indices.
    pub fn cut_by_index<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let count = self.child_count();
        let (from, to) = util::bounds(&range, count);
        let (from, to) = (from.min(count), to.min(count));
        if from == 0 && to == count {
            return self.clone();
        }
        if from >= to {
            return Self::new();
        }
        Self::from_normalized(self.children()[from..to].to_vec())
    }

    /// Create a new fragment in which the node at the given index is replaced by the given node.
    pub fn replace_child(&self, index: usize, node: Node) -> Result<Cow<'_, Self>, IndexError> {
        let current = self.child(index)?;
        if current.is_text() || node.is_text() {
            return Err(IndexError::TextChild);
        }
        if current.ptr_eq(&node) {
            return Ok(Cow::Borrowed(self));
        }
        let mut copy = self.children().to_vec();
        copy[index] = node;
        Ok(Cow::Owned(Self::from_normalized(copy)))
    }

    /// Invoke a callback for all descendant nodes between the given two positions (relative to
    /// start of this fragment). The callback gets the node, its position, its parent and its
    /// index in the parent. Doesn't descend into a node when the callback returns `false`.
    pub fn nodes_between<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: Option<&Node>,
    ) where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content_size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    usize::min(child.content_size(), to - start),
                    f,
                    node_start + start,
                    Some(child),
                );
            }
            pos = end;
        }
    }

    /// Call the given callback for every descendant node.
    pub fn descendants<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between(0, self.size, &mut f, 0, None)
    }

    /// Get all text between positions from and to. When `block_separator` is given, it will be
    /// inserted whenever a new block node is started. When `leaf_text` is given, it'll be inserted
    /// for every non-text leaf node encountered.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: Option<&str>,
    ) -> String {
        let mut text = String::new();
        let mut separated = true;
        self.nodes_between(
            from,
            to,
            &mut |node: &Node, pos: usize, _: Option<&Node>, _: usize| {
                if let Some(txt) = node.text() {
                    text.push_str(util::slice_utf16(txt, from.saturating_sub(pos), to - pos));
                    separated = block_separator.is_none();
                } else if node.is_leaf() {
                    if let Some(leaf_text) = leaf_text {
                        text.push_str(leaf_text);
                    }
                    separated = block_separator.is_none();
                } else if !separated && node.is_block() {
                    text.push_str(block_separator.unwrap_or(""));
                    separated = true;
                }
                true
            },
            0,
            None,
        );
        text
    }

    /// A copy with the child at `index` swapped for `node`, without checks
    pub(crate) fn with_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.children().to_vec();
        nodes[index] = node;
        Self::from(nodes)
    }

    pub(crate) fn fmt_inner(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(child, f)?;
        }
        Ok(())
    }
}

fn close_at(node: Node, depth: usize, side: Side) -> Result<Node, ReplaceError> {
    if depth == 0 {
        Ok(node)
    } else {
        node.close(depth - 1, side)
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.children() == other.children()
    }
}

impl Eq for Fragment {}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        self.fmt_inner(f)?;
        f.write_str(">")
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Fragment {
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        self.children().serialize(serializer)
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(src: Vec<Node>) -> Fragment {
        let mut nodes: Vec<Node> = Vec::with_capacity(src.len());
        for node in src {
            if let Some(last) = nodes.last_mut() {
                if let Some(joined) = last.join_text(&node) {
                    *last = joined;
                    continue;
                }
            }
            nodes.push(node);
        }
        Self::from_normalized(nodes)
    }
}

impl From<Fragment> for Vec<Node> {
    fn from(src: Fragment) -> Vec<Node> {
        src.into_children()
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Self::from_normalized(vec![node])
    }
}

impl FromIterator<Node> for Fragment {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::IndexError;
    use crate::schema::tests::schema;
    use crate::{Fragment, Index, MarkSet, Node, Schema};

    fn text(schema: &Schema, s: &str) -> Node {
        schema.text(s, MarkSet::default()).unwrap()
    }

    fn em(schema: &Schema, s: &str) -> Node {
        let em = schema.mark("em", None).unwrap();
        schema.text(s, em.to_set()).unwrap()
    }

    fn para(schema: &Schema, content: Vec<Node>) -> Node {
        schema
            .node("paragraph", None, Fragment::from(content), MarkSet::default())
            .unwrap()
    }

    #[test]
    fn merges_adjacent_text() {
        let schema = schema();
        let frag = Fragment::from(vec![text(&schema, "ab"), text(&schema, "cd"), em(&schema, "e")]);
        assert_eq!(frag.child_count(), 2);
        assert_eq!(frag.size(), 5);
        assert!(frag.is_text_runs());
        assert_eq!(frag.to_string(), "<\"abcd\", em(\"e\")>");
    }

    #[test]
    fn block_content_is_flat() {
        let schema = schema();
        let frag = Fragment::from(vec![para(&schema, vec![]), para(&schema, vec![])]);
        assert!(!frag.is_text_runs());
        assert_eq!(frag.size(), 4);
    }

    #[test]
    fn finds_index() {
        let schema = schema();
        let frag = Fragment::from(vec![text(&schema, "ab"), em(&schema, "cde")]);
        assert_eq!(frag.find_index(0, false), Ok(Index::new(0, 0)));
        assert_eq!(frag.find_index(1, false), Ok(Index::new(0, 0)));
        assert_eq!(frag.find_index(1, true), Ok(Index::new(1, 2)));
        assert_eq!(frag.find_index(2, false), Ok(Index::new(1, 2)));
        assert_eq!(frag.find_index(4, false), Ok(Index::new(1, 2)));
        assert_eq!(frag.find_index(5, false), Ok(Index::new(2, 5)));
        assert_eq!(
            frag.find_index(6, false),
            Err(IndexError::Position { pos: 6, size: 5 })
        );
    }

    #[test]
    fn cuts_text_runs() {
        let schema = schema();
        let frag = Fragment::from(vec![
            text(&schema, "abc"),
            em(&schema, "def"),
            text(&schema, "gh"),
        ]);
        assert_eq!(frag.cut(2..7).to_string(), "<\"c\", em(\"def\"), \"g\">");
        assert_eq!(frag.cut(3..6).to_string(), "<em(\"def\")>");
        assert_eq!(frag.cut(4..4).child_count(), 0);
        assert_eq!(frag.cut(..), frag);
    }

    #[test]
    fn cuts_into_blocks() {
        let schema = schema();
        let frag = Fragment::from(vec![
            para(&schema, vec![text(&schema, "one")]),
            para(&schema, vec![text(&schema, "two")]),
        ]);
        assert_eq!(
            frag.cut(2..7).to_string(),
            "<paragraph(\"ne\"), paragraph(\"t\")>"
        );
        assert_eq!(frag.cut_by_index(1..).to_string(), "<paragraph(\"two\")>");
    }

    #[test]
    fn appends_and_merges_text() {
        let schema = schema();
        let a = Fragment::from(vec![text(&schema, "ab")]);
        let b = Fragment::from(vec![text(&schema, "cd"), em(&schema, "e")]);
        let joined = a.append(b);
        assert_eq!(joined.child_count(), 2);
        assert_eq!(joined.first_child().unwrap().text(), Some("abcd"));
    }

    #[test]
    fn appends_with_open_depths() {
        let schema = schema();
        let a = Fragment::from(vec![para(&schema, vec![text(&schema, "ab")])]);
        let b = Fragment::from(vec![para(&schema, vec![text(&schema, "cd")])]);
        assert_eq!(a.append_open(&b, 1, 1).unwrap().to_string(), "<paragraph(\"abcd\")>");
        assert_eq!(a.append_open(&b, 0, 0).unwrap().child_count(), 2);
    }

    #[test]
    fn closes_open_nodes_when_appending() {
        let schema = schema();
        let quote = schema
            .node("blockquote", None, Fragment::new(), MarkSet::default())
            .unwrap();
        let a = Fragment::from(vec![quote]);
        let b = Fragment::from(vec![para(&schema, vec![text(&schema, "x")])]);
        let joined = a.append_open(&b, 1, 1).unwrap();
        assert_eq!(joined.to_string(), "<blockquote(paragraph), paragraph(\"x\")>");
    }

    #[test]
    fn replaces_children() {
        let schema = schema();
        let frag = Fragment::from(vec![para(&schema, vec![]), para(&schema, vec![])]);
        let replaced = frag
            .replace_child(1, para(&schema, vec![text(&schema, "x")]))
            .unwrap();
        assert_eq!(replaced.size(), 5);
        assert_eq!(
            frag.replace_child(2, para(&schema, vec![])),
            Err(IndexError::Child { index: 2, count: 2 })
        );
        let runs = Fragment::from(vec![text(&schema, "a")]);
        assert_eq!(
            runs.replace_child(0, text(&schema, "b")),
            Err(IndexError::TextChild)
        );
    }

    #[test]
    fn walks_nodes_between() {
        let schema = schema();
        let frag = Fragment::from(vec![
            para(&schema, vec![text(&schema, "one")]),
            para(&schema, vec![text(&schema, "two")]),
        ]);
        let mut seen = vec![];
        frag.nodes_between(
            3,
            7,
            &mut |node: &Node, pos, _: Option<&Node>, _| {
                seen.push((node.r#type().name().to_owned(), pos));
                true
            },
            0,
            None,
        );
        assert_eq!(
            seen,
            vec![
                ("paragraph".into(), 0),
                ("text".into(), 1),
                ("paragraph".into(), 5),
                ("text".into(), 6)
            ]
        );
        assert_eq!(frag.text_between(2, 8, Some("|"), None), "ne|tw");
    }

    #[test]
    fn iterates_both_ways() {
        let schema = schema();
        let frag = Fragment::from(vec![text(&schema, "a"), em(&schema, "b")]);
        let forward: Vec<_> = frag.iter().filter_map(Node::text).collect();
        let backward: Vec<_> = frag.reverse_iter().filter_map(Node::text).collect();
        assert_eq!(forward, vec!["a", "b"]);
        assert_eq!(backward, vec!["b", "a"]);
        let mut offsets = vec![];
        frag.for_each(|_, offset, index| offsets.push((offset, index)));
        assert_eq!(offsets, vec![(0, 0), (1, 1)]);
    }
}
