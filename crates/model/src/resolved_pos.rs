use crate::fragment::IndexError;
use crate::{util, MarkSet, Node};
use derive_new::new;
use displaydoc::Display;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Errors at `resolve`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Error)]
pub enum ResolveErr {
    /// Position {pos} out of range
    RangeError {
        /// The position that was out of range
        pos: usize,
    },
    /// Position {pos} falls inside a character
    InsideCharacter {
        /// The position that splits a surrogate pair
        pos: usize,
    },
    /// Index error
    Index(#[from] IndexError),
}

/// A child index together with the offset of that child
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, new)]
pub struct Index {
    /// The index of the child
    pub index: usize,
    /// The offset where the child starts
    pub offset: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, new)]
/// A node in the resolution path
pub struct ResolvedNode<'a> {
    /// Reference to the node
    pub node: &'a Node,
    /// Index of the in the parent fragment
    pub index: usize,
    /// Offset immediately before the node
    pub before: usize,
}

impl<'a> fmt::Debug for ResolvedNode<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedNode")
            .field("node.type", self.node.r#type())
            .field("index", &self.index)
            .field("before", &self.before)
            .finish()
    }
}

/// You can resolve a position to get more information about it. Objects of this class represent
/// such a resolved position, providing various pieces of context information, and some helper
/// methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<ResolvedNode<'a>>,
    parent_offset: usize,
    depth: usize,
}

impl<'a> ResolvedPos<'a> {
    pub(crate) fn new(pos: usize, path: Vec<ResolvedNode<'a>>, parent_offset: usize) -> Self {
        Self {
            depth: path.len() - 1,
            pos,
            path,
            parent_offset,
        }
    }

    /// The position that was resolved.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The number of levels the parent node is from the root. If this position points directly
    /// into the root node, it is 0. If it points into a top-level paragraph, 1, and so on.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The offset this position has into its parent node.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The path from the root to the parent
    pub fn path(&self) -> &[ResolvedNode<'a>] {
        &self.path
    }

    /// The parent node that the position points into. Note that even if
    /// a position points into a text node, that node is not considered
    /// the parent. Text nodes are flat in this model and have no content.
    pub fn parent(&self) -> &'a Node {
        self.node(self.depth)
    }

    /// The root node in which the position was resolved.
    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    /// The ancestor node at the given level. `p.node(p.depth)` is the same as `p.parent()`.
    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    /// The index into the ancestor at the given level. If this points at the 3rd node in the
    /// 2nd paragraph on the top level, for example, `p.index(0)` is 1 and `p.index(1)` is 2.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// The index pointing after this position into the ancestor at the given level.
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// The (absolute) position at the start of the node at the given level.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].before + 1
        }
    }

    /// The (absolute) position at the end of the node at the given level.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// The (absolute) position directly before the wrapping node at the given level, or, when
    /// depth is `self.depth + 1`, the original position.
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else if depth == self.depth + 1 {
            Some(self.pos)
        } else {
            Some(self.path[depth - 1].before)
        }
    }

    /// The (absolute) position directly after the wrapping node at the given level, or the
    /// original position when depth is `self.depth + 1`.
    pub fn after(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else if depth == self.depth + 1 {
            Some(self.pos)
        } else {
            Some(self.path[depth - 1].before + self.path[depth].node.node_size())
        }
    }

    /// When this position points into a text node, this returns the
    /// distance between the position and the start of the text node.
    /// Will be zero for positions that point between nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth].before
    }

    /// Get the node directly before the position, if any. If the position points into a text node,
    /// only the part of that node before the position is returned.
    pub fn node_before(&self) -> Option<Cow<'a, Node>> {
        let index = self.index(self.depth);
        let d_off = self.text_offset();
        let parent = self.parent();
        if d_off > 0 {
            parent.maybe_child(index).map(|child| child.cut(0..d_off))
        } else if index == 0 {
            None
        } else {
            parent.maybe_child(index - 1).map(Cow::Borrowed)
        }
    }

    /// Get the node directly after the position, if any. If the position points into a text node,
    /// only the part of that node after the position is returned.
    pub fn node_after(&self) -> Option<Cow<'a, Node>> {
        let index = self.index(self.depth);
        let d_off = self.text_offset();
        let child = self.parent().maybe_child(index)?;
        if d_off > 0 {
            Some(child.cut(d_off..))
        } else {
            Some(Cow::Borrowed(child))
        }
    }

    /// Get the marks at this position: those of the text it points into, or
    /// of the node before it (the node after it at the start of the parent).
    pub fn marks(&self) -> MarkSet {
        let parent = self.parent();
        let index = self.index(self.depth);
        if parent.content_size() == 0 {
            return MarkSet::default();
        }
        if self.text_offset() > 0 {
            if let Some(child) = parent.maybe_child(index) {
                return child.marks().clone();
            }
        }
        index
            .checked_sub(1)
            .and_then(|i| parent.maybe_child(i))
            .or_else(|| parent.maybe_child(index))
            .map(|n| n.marks().clone())
            .unwrap_or_default()
    }

    /// The depth up to which this position and the given (non-resolved)
    /// position share the same parent nodes.
    pub fn shared_depth(&self, pos: usize) -> usize {
        for depth in (1..=self.depth).rev() {
            if self.start(depth) <= pos && self.end(depth) >= pos {
                return depth;
            }
        }
        0
    }

    /// The deepest level at which this position and the other one point
    /// into the same child.
    pub fn same_depth(&self, other: &ResolvedPos) -> usize {
        let max = usize::min(self.depth, other.depth);
        let mut depth = 0;
        while depth < max && self.index(depth) == other.index(depth) {
            depth += 1;
        }
        depth
    }

    /// Query whether the given position shares the same parent node.
    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.pos - self.parent_offset == other.pos - other.parent_offset
    }

    /// Returns a range based on the place where this position and the given position diverge
    /// around block content. If both point into the same textblock, for example, a range around
    /// that textblock will be returned. If they point into different blocks, the range around
    /// those blocks in their shared ancestor is returned. You can pass in an optional predicate
    /// that will be called with a parent node to see if a range into that parent is acceptable.
    ///
    /// The innermost qualifying range is returned.
    pub fn block_range<F>(&self, other: &ResolvedPos<'a>, pred: F) -> Option<NodeRange<'a>>
    where
        F: Fn(&Node) -> bool,
    {
        if other.pos < self.pos {
            return other.block_range(self, pred);
        }
        let skip = self.parent().is_textblock() || self.pos == other.pos;
        let top = if skip {
            self.depth.checked_sub(1)?
        } else {
            self.depth
        };
        (0..=top)
            .rev()
            .find(|&d| other.pos <= self.end(d) && pred(self.node(d)))
            .map(|depth| NodeRange::new(self.clone(), other.clone(), depth))
    }

    /// The position of the child at `index` in the ancestor at the given level.
    pub fn pos_at_index(&self, index: usize, depth: usize) -> Result<usize, IndexError> {
        let node = self.node(depth);
        let count = node.child_count();
        if index > count {
            return Err(IndexError::Child { index, count });
        }
        let offset: usize = node.content().iter().take(index).map(Node::node_size).sum();
        Ok(self.start(depth) + offset)
    }

    pub(crate) fn resolve(doc: &'a Node, pos: usize) -> Result<Self, ResolveErr> {
        if pos > doc.content_size() {
            return Err(ResolveErr::RangeError { pos });
        }
        let mut path = vec![];
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc;

        loop {
            let Index { index, offset } = node.content().find_index(parent_offset, false)?;
            let rem = parent_offset - offset;
            path.push(ResolvedNode::new(node, index, start + offset));
            if rem == 0 {
                break;
            }
            node = node.child(index)?;
            if let Some(text) = node.text() {
                if !util::is_utf16_boundary(text, rem) {
                    return Err(ResolveErr::InsideCharacter { pos });
                }
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
        }
        Ok(ResolvedPos::new(pos, path, parent_offset))
    }
}

impl<'a> fmt::Display for ResolvedPos<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for depth in 1..=self.depth {
            if depth > 1 {
                f.write_str("/")?;
            }
            write!(f, "{}_{}", self.node(depth).r#type().name(), self.index(depth - 1))?;
        }
        write!(f, ":{}", self.parent_offset)
    }
}

/// Represents a flat range of content, i.e. one that starts and ends in the same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRange<'a> {
    /// A resolved position along the start of the content.
    pub from: ResolvedPos<'a>,
    /// A position along the end of the content.
    pub to: ResolvedPos<'a>,
    /// The depth of the node that this range points into.
    pub depth: usize,
}

impl<'a> NodeRange<'a> {
    /// Construct a node range. `from` and `to` should point into the same
    /// node until at least the given `depth`, since a node range denotes an
    /// adjacent set of nodes in a single parent node.
    pub fn new(from: ResolvedPos<'a>, to: ResolvedPos<'a>, depth: usize) -> Self {
        Self { from, to, depth }
    }

    /// The position at the start of the range.
    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1).unwrap_or(0)
    }

    /// The position at the end of the range.
    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1).unwrap_or(0)
    }

    /// The parent node that the range points into.
    pub fn parent(&self) -> &'a Node {
        self.from.node(self.depth)
    }

    /// The start index of the range in the parent node.
    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    /// The end index of the range in the parent node.
    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}
