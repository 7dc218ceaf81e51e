use crate::fragment::IndexError;
use crate::resolved_pos::{Index, ResolveErr, ResolvedPos};
use crate::{Fragment, Node};
use displaydoc::Display;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// A slice of a fragment
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice {
    /// The slice's content.
    #[serde(skip_serializing_if = "Fragment::is_empty")]
    pub content: Fragment,
    /// The open depth at the start.
    #[serde(skip_serializing_if = "is_zero")]
    pub open_start: usize,
    /// The open depth at the end.
    #[serde(skip_serializing_if = "is_zero")]
    pub open_end: usize,
}

impl Slice {
    /// Create a slice. When specifying a non-zero open depth, you must
    /// make sure that there are nodes of at least that depth at the
    /// appropriate side of the fragment. If the fragment is an empty
    /// paragraph node, `open_start` and `open_end` can't be greater than 1.
    ///
    /// It is not necessary for the content of open nodes to conform to
    /// the schema's content constraints, though it should be a valid
    /// start/end/middle for such a node, depending on which sides are
    /// open.
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Slice {
        Slice {
            content,
            open_start,
            open_end,
        }
    }

    /// Create a slice from a fragment by taking the maximum possible open
    /// value on both side of the fragment.
    pub fn max_open(content: Fragment) -> Slice {
        let open_start = open_depth(content.first_child(), false);
        let open_end = open_depth(content.last_child(), true);
        Slice::new(content, open_start, open_end)
    }

    /// The size this slice would add when inserted into a document.
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    /// Insert a fragment at the given position (relative to the slice's
    /// start). Returns `None` when the receiving node can't take the
    /// fragment there.
    pub fn insert_at(&self, pos: usize, fragment: Fragment) -> Result<Option<Slice>, InsertError> {
        let content = insert_into(&self.content, pos + self.open_start, fragment, None)?;
        Ok(content.map(|c| Slice::new(c, self.open_start, self.open_end)))
    }
}

/// How many non-leaf nodes are nested along the first (or last) edge
/// starting at `node`
pub(crate) fn open_depth(mut node: Option<&Node>, last: bool) -> usize {
    let mut depth = 0;
    while let Some(n) = node.filter(|n| !n.is_leaf() && !n.is_text()) {
        depth += 1;
        node = if last { n.last_child() } else { n.first_child() };
    }
    depth
}

/// Error on slicing a node
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SliceError {
    /// Could not resolve a position
    Resolve(#[from] ResolveErr),
}

/// Error on insertion
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum InsertError {
    /// Index error
    Index(#[from] IndexError),
}

fn insert_into(
    content: &Fragment,
    dist: usize,
    insert: Fragment,
    parent: Option<&Node>,
) -> Result<Option<Fragment>, InsertError> {
    let Index { index, offset } = content.find_index(dist, false)?;
    let child = content.maybe_child(index);
    match child {
        Some(child) if offset != dist && !child.is_text() => {
            let inner = insert_into(child.content(), dist - offset - 1, insert, Some(child))?;
            Ok(inner.map(|i| content.with_child(index, child.copy(|_| i))))
        }
        _ => {
            if let Some(p) = parent {
                if !p.can_replace(index, index, &insert)? {
                    return Ok(None);
                }
            }
            Ok(Some(
                content
                    .cut(..dist)
                    .append(insert)
                    .append(content.cut(dist..)),
            ))
        }
    }
}

/// An error that can occur when replacing a slice
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ReplaceError {
    /// Inserted content deeper than insertion position
    InsertTooDeep,
    /// Inconsistent open depths
    InconsistentOpenDepths {
        /// Depth at the start
        from_depth: usize,
        /// How many nodes are "open" at the start
        open_start: usize,
        /// Depth at the end
        to_depth: usize,
        /// How many nodes are "open" at the end
        open_end: usize,
    },
    /// Slice is open {open} deep but its content only nests {depth} deep
    OpenTooDeep {
        /// The open depth of the slice on the offending side
        open: usize,
        /// The depth of the content on that side
        depth: usize,
    },
    /// Could not resolve an index
    Resolve(#[from] ResolveErr),
    /// Index error
    Index(#[from] IndexError),
    /// Cannot join {0} onto {1}
    CannotJoin(String, String),
    /// Invalid content for node {0}
    InvalidContent(String),
}

pub(crate) fn replace(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ReplaceError> {
    tracing::trace!(
        from = rp_from.pos(),
        to = rp_to.pos(),
        open_start = slice.open_start,
        open_end = slice.open_end,
        "replace"
    );
    if slice.open_start > rp_from.depth() {
        Err(ReplaceError::InsertTooDeep)
    } else if rp_from.depth() - slice.open_start != rp_to.depth().wrapping_sub(slice.open_end) {
        Err(ReplaceError::InconsistentOpenDepths {
            from_depth: rp_from.depth(),
            open_start: slice.open_start,
            to_depth: rp_to.depth(),
            open_end: slice.open_end,
        })
    } else {
        check_open_depth(slice)?;
        replace_outer(rp_from, rp_to, slice, 0)
    }
}

fn check_open_depth(slice: &Slice) -> Result<(), ReplaceError> {
    let start = open_depth(slice.content.first_child(), false);
    let end = open_depth(slice.content.last_child(), true);
    if slice.open_start > start {
        Err(ReplaceError::OpenTooDeep {
            open: slice.open_start,
            depth: start,
        })
    } else if slice.open_end > end {
        Err(ReplaceError::OpenTooDeep {
            open: slice.open_end,
            depth: end,
        })
    } else {
        Ok(())
    }
}

fn replace_outer(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ReplaceError> {
    let index = rp_from.index(depth);
    let node = rp_from.node(depth);
    if index == rp_to.index(depth) && depth < rp_from.depth() - slice.open_start {
        // When both `from` and `to` are in the same child and the we are not at an open node yet
        let inner = replace_outer(rp_from, rp_to, slice, depth + 1)?;
        Ok(node.copy(|c| c.with_child(index, inner)))
    } else if slice.content.size() == 0 {
        // When we just delete content, i.e. the replacement slice is empty
        let (before, after) = replace_two_way(rp_from, rp_to, depth)?;
        close_two_way(node, before, after)
    } else if slice.open_start == 0
        && slice.open_end == 0
        && rp_from.depth() == depth
        && rp_to.depth() == depth
    {
        // If no parent nodes are open, and the position of both `from` and `to` is at
        // the current level:

        // Simple, flat case
        let parent = rp_from.parent();
        let content = parent.content();
        let before = content.cut(..rp_from.parent_offset());
        let after = content.cut(rp_to.parent_offset()..);
        close_three_way(parent, before, slice.content.clone(), after)
    } else {
        let (n, start, end) = prepare_slice_for_replace(slice, rp_from);
        let rp_start = n.resolve(start)?;
        let rp_end = n.resolve(end)?;
        let (before, mid, after) = replace_three_way(rp_from, &rp_start, &rp_end, rp_to, depth)?;
        close_three_way(node, before, mid, after)
    }
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    let sub_type = sub.r#type();
    let main_type = main.r#type();
    if main_type.can_contain_content(sub_type) {
        Ok(())
    } else {
        tracing::debug!(sub = %sub_type, main = %main_type, "rejected join");
        Err(ReplaceError::CannotJoin(
            sub_type.name().to_owned(),
            main_type.name().to_owned(),
        ))
    }
}

fn joinable<'a>(
    rp_before: &ResolvedPos<'a>,
    rp_after: &ResolvedPos<'a>,
    depth: usize,
) -> Result<&'a Node, ReplaceError> {
    let node = rp_before.node(depth);
    check_join(node, rp_after.node(depth))?;
    Ok(node)
}

fn add_node(child: Cow<Node>, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut() {
        if let Some(joined) = last.join_text(&child) {
            *last = joined;
            return;
        }
    }
    target.push(child.into_owned());
}

/// Which children of a node `add_range` copies, relative to resolved positions
#[derive(Clone, Copy)]
enum Bounds<'b, 'a> {
    /// The children before the position
    Before(&'b ResolvedPos<'a>),
    /// The children after the position
    After(&'b ResolvedPos<'a>),
    /// The children between the two positions
    Between(&'b ResolvedPos<'a>, &'b ResolvedPos<'a>),
}

impl<'b, 'a> Bounds<'b, 'a> {
    fn start(self) -> Option<&'b ResolvedPos<'a>> {
        match self {
            Bounds::After(start) | Bounds::Between(start, _) => Some(start),
            Bounds::Before(_) => None,
        }
    }

    fn end(self) -> Option<&'b ResolvedPos<'a>> {
        match self {
            Bounds::Before(end) | Bounds::Between(_, end) => Some(end),
            Bounds::After(_) => None,
        }
    }

    fn parent(self, depth: usize) -> &'a Node {
        match self {
            Bounds::Before(rp) | Bounds::After(rp) | Bounds::Between(_, rp) => rp.node(depth),
        }
    }
}

fn add_range(bounds: Bounds, depth: usize, target: &mut Vec<Node>) {
    let node = bounds.parent(depth);
    let mut start_index = 0;

    let end_index = match bounds.end() {
        Some(rp_end) => rp_end.index(depth),
        None => node.child_count(),
    };

    if let Some(rp_start) = bounds.start() {
        start_index = rp_start.index(depth);
        if rp_start.depth() > depth {
            start_index += 1;
        } else if rp_start.text_offset() > 0 {
            if let Some(after) = rp_start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    let children = node.content().children();
    for child in children.get(start_index..end_index).unwrap_or_default() {
        add_node(Cow::Borrowed(child), target);
    }
    if let Some(rp_end) = bounds.end() {
        if rp_end.depth() == depth && rp_end.text_offset() > 0 {
            if let Some(before) = rp_end.node_before() {
                add_node(before, target);
            }
        }
    }
}

fn close(node: &Node, content: Fragment) -> Result<Node, ReplaceError> {
    let node_type = node.r#type();
    if node_type.valid_content(&content, node.attrs()) {
        Ok(node.copy(|_| content))
    } else {
        tracing::debug!(node = %node_type, "rejected content");
        Err(ReplaceError::InvalidContent(node_type.name().to_owned()))
    }
}

/// Close `node` with the content `before + after`, filling in nodes
/// between the two when that content isn't valid on its own.
fn close_two_way(node: &Node, before: Fragment, after: Fragment) -> Result<Node, ReplaceError> {
    let attrs = node.attrs();
    let expr = node.r#type().content_expr();
    let joined = before.clone().append(after.clone());
    if expr.matches(attrs, &joined) {
        return Ok(node.copy(|_| joined));
    }
    match expr.fill_two_way(attrs, &before, &after) {
        Some(fill) => {
            tracing::debug!(node = %node.r#type(), filled = fill.child_count(), "filled content");
            close(node, before.append(fill).append(after))
        }
        None => close(node, joined),
    }
}

/// Close `node` with the content `before + mid + after`, filling in
/// nodes around `mid` when that content isn't valid on its own.
fn close_three_way(
    node: &Node,
    before: Fragment,
    mid: Fragment,
    after: Fragment,
) -> Result<Node, ReplaceError> {
    let attrs = node.attrs();
    let expr = node.r#type().content_expr();
    let joined = before.clone().append(mid.clone()).append(after.clone());
    if expr.matches(attrs, &joined) {
        return Ok(node.copy(|_| joined));
    }
    match expr.fill_three_way(attrs, &before, &mid, &after) {
        Some((left, right)) => {
            tracing::debug!(
                node = %node.r#type(),
                left = left.child_count(),
                right = right.child_count(),
                "filled content"
            );
            close(
                node,
                before.append(left).append(mid).append(right).append(after),
            )
        }
        None => close(node, joined),
    }
}

fn replace_three_way(
    rp_from: &ResolvedPos,
    rp_start: &ResolvedPos,
    rp_end: &ResolvedPos,
    rp_to: &ResolvedPos,
    depth: usize,
) -> Result<(Fragment, Fragment, Fragment), ReplaceError> {
    let open_start = if rp_from.depth() > depth {
        Some(joinable(rp_from, rp_start, depth + 1)?)
    } else {
        None
    };
    let open_end = if rp_to.depth() > depth {
        Some(joinable(rp_end, rp_to, depth + 1)?)
    } else {
        None
    };

    let mut before = Vec::new();
    let mut mid = Vec::new();
    let mut after = Vec::new();
    add_range(Bounds::Before(rp_from), depth, &mut before);
    match (open_start, open_end) {
        (Some(os), Some(oe)) if rp_start.index(depth) == rp_end.index(depth) => {
            check_join(os, oe)?;
            let (b, m, a) = replace_three_way(rp_from, rp_start, rp_end, rp_to, depth + 1)?;
            let closed = close_three_way(os, b, m, a)?;
            add_node(Cow::Owned(closed), &mut mid);
        }
        _ => {
            if let Some(os) = open_start {
                let (b, a) = replace_two_way(rp_from, rp_start, depth + 1)?;
                let closed = close_two_way(os, b, a)?;
                add_node(Cow::Owned(closed), &mut before);
            }
            add_range(Bounds::Between(rp_start, rp_end), depth, &mut mid);
            if let Some(oe) = open_end {
                let (b, a) = replace_two_way(rp_end, rp_to, depth + 1)?;
                let closed = close_two_way(oe, b, a)?;
                add_node(Cow::Owned(closed), &mut after);
            }
        }
    }
    add_range(Bounds::After(rp_to), depth, &mut after);
    Ok((
        Fragment::from(before),
        Fragment::from(mid),
        Fragment::from(after),
    ))
}

fn replace_two_way(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    depth: usize,
) -> Result<(Fragment, Fragment), ReplaceError> {
    let mut before = Vec::new();
    let mut after = Vec::new();
    add_range(Bounds::Before(rp_from), depth, &mut before);
    if rp_from.depth() > depth {
        let node = joinable(rp_from, rp_to, depth + 1)?;
        let (b, a) = replace_two_way(rp_from, rp_to, depth + 1)?;
        let child = close_two_way(node, b, a)?;
        add_node(Cow::Owned(child), &mut before);
    }
    add_range(Bounds::After(rp_to), depth, &mut after);
    Ok((Fragment::from(before), Fragment::from(after)))
}

fn prepare_slice_for_replace(slice: &Slice, rp_along: &ResolvedPos) -> (Node, usize, usize) {
    let extra = rp_along.depth() - slice.open_start;
    let parent = rp_along.node(extra);
    let mut node = parent.copy(|_| slice.content.clone());
    for i in (0..extra).rev() {
        node = rp_along.node(i).copy(|_| Fragment::from(node));
    }

    let start = slice.open_start + extra;
    let end = node.content_size() - slice.open_end - extra;
    (node, start, end)
}
