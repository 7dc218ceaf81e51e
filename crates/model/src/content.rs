use crate::schema::{Attrs, SchemaInner};
use crate::{Fragment, Node, NodeType, Schema};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

pub use crate::parse::SyntaxError;

/// A repeat count in a content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Count {
    /// A fixed number
    Literal(u32),
    /// The value of a numeric attribute of the parent node
    Attr(String),
}

impl Count {
    /// Resolve the count against the attributes of a node
    pub fn resolve(&self, attrs: &Attrs) -> usize {
        match self {
            Count::Literal(n) => *n as usize,
            Count::Attr(name) => match attrs.get(name).and_then(Value::as_u64) {
                Some(n) => n as usize,
                None => {
                    tracing::warn!(attr = %name, "count attribute is not a number, using 0");
                    0
                }
            },
        }
    }
}

/// The marks allowed on the nodes of a content element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkRule {
    /// No marks at all
    None,
    /// Any mark
    All,
    /// The marks with the given ranks
    Only(Vec<usize>),
}

impl MarkRule {
    /// Whether the mark type with the given rank is allowed
    pub fn allows(&self, rank: usize) -> bool {
        match self {
            MarkRule::None => false,
            MarkRule::All => true,
            MarkRule::Only(ranks) => ranks.contains(&rank),
        }
    }

    /// Whether every mark allowed by `other` is allowed here too
    pub fn covers(&self, other: &MarkRule) -> bool {
        match (self, other) {
            (MarkRule::All, _) | (_, MarkRule::None) => true,
            (MarkRule::None, _) | (MarkRule::Only(_), MarkRule::All) => false,
            (MarkRule::Only(mine), MarkRule::Only(theirs)) => {
                theirs.iter().all(|r| mine.contains(r))
            }
        }
    }
}

/// One quantified part of a content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentElement {
    pub(crate) node_types: Vec<usize>,
    pub(crate) marks: MarkRule,
    pub(crate) min: Count,
    pub(crate) max: Option<Count>,
    pub(crate) modulo: Option<Count>,
}

impl ContentElement {
    /// Indices of the node types this element matches
    pub(crate) fn node_types(&self) -> &[usize] {
        &self.node_types
    }

    /// The marks allowed on matched nodes
    pub fn marks(&self) -> &MarkRule {
        &self.marks
    }

    /// The minimum count
    pub fn min(&self, attrs: &Attrs) -> usize {
        self.min.resolve(attrs)
    }

    /// The maximum count, `None` when unbounded
    pub fn max(&self, attrs: &Attrs) -> Option<usize> {
        self.max.as_ref().map(|c| c.resolve(attrs))
    }

    fn modulo(&self, attrs: &Attrs) -> Option<usize> {
        self.modulo
            .as_ref()
            .map(|c| c.resolve(attrs))
            .filter(|&k| k > 0)
    }

    pub(crate) fn is_fixed(&self) -> bool {
        Some(&self.min) == self.max.as_ref()
    }

    pub(crate) fn overlaps(&self, other: &ContentElement) -> bool {
        self.node_types.iter().any(|t| other.node_types.contains(t))
    }

    /// Whether the node is of one of this element's types and only has allowed marks
    pub fn matches_node(&self, node: &Node) -> bool {
        self.node_types.contains(&node.r#type().index())
            && node.marks().iter().all(|m| self.marks.allows(m.r#type().rank()))
    }

    /// How many more nodes are needed after `count` nodes to satisfy this
    /// element, or `None` if it can't be satisfied from here.
    pub fn needed(&self, attrs: &Attrs, count: usize) -> Option<usize> {
        let min = self.min(attrs);
        let mut target = count.max(min);
        if let Some(k) = self.modulo(attrs) {
            if target > 0 || min > 0 {
                target = target.max(k);
                target = (target + k - 1) / k * k;
            }
        }
        match self.max(attrs) {
            Some(max) if target > max => None,
            _ => Some(target - count),
        }
    }

    /// Whether `count` nodes satisfy this element
    pub fn satisfied(&self, attrs: &Attrs, count: usize) -> bool {
        self.needed(attrs, count) == Some(0)
    }

    fn accepts_more(&self, attrs: &Attrs, count: usize) -> bool {
        self.max(attrs).map_or(true, |max| count < max)
    }

    fn create_filler(&self, schema: &Schema, stack: &mut Vec<usize>) -> Option<Node> {
        self.node_types
            .iter()
            .map(|&t| schema.node_type_at(t))
            .filter(|t| !t.is_text() && !t.has_required_attrs())
            .find_map(|t| t.create_filler(stack))
    }
}

/// A cursor into a content expression: the element at `index` has matched
/// `count` nodes so far.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchPos {
    /// The element index
    pub index: usize,
    /// The number of nodes matched by that element
    pub count: usize,
}

impl MatchPos {
    /// Create a new cursor
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }
}

/// The compiled content expression of a node type.
///
/// Matching is greedy: a node is taken by the current element whenever it
/// can be, and the expression only moves on to the next element when the
/// current one doesn't accept the node. Overlapping adjacent elements are
/// rejected when parsing, which makes this unambiguous.
#[derive(Clone)]
pub struct ContentExpr {
    schema: Weak<SchemaInner>,
    elements: Vec<ContentElement>,
    inline: bool,
}

impl ContentExpr {
    pub(crate) fn new(schema: Weak<SchemaInner>, parsed: crate::parse::Parsed) -> Self {
        Self {
            schema,
            elements: parsed.elements,
            inline: parsed.inline,
        }
    }

    /// Compile an expression in the context of a node type. Names resolve
    /// in the type's schema, `@` counts refer to the type's attributes.
    pub fn parse(node_type: &NodeType, expr: &str) -> Result<Self, SyntaxError> {
        let schema = node_type.schema();
        let parsed = crate::parse::parse(
            &schema.0.table,
            node_type.name(),
            &node_type.data().attrs,
            expr,
        )?;
        Ok(Self::new(Arc::downgrade(&schema.0), parsed))
    }

    fn schema(&self) -> Option<Schema> {
        self.schema.upgrade().map(Schema)
    }

    /// The elements of the expression
    pub fn elements(&self) -> &[ContentElement] {
        &self.elements
    }

    /// True when the expression allows no content
    pub fn is_leaf(&self) -> bool {
        self.elements.is_empty()
    }

    /// True when the expression matches inline nodes
    pub fn inline_content(&self) -> bool {
        self.inline
    }

    /// The cursor at the start of the expression
    pub fn start(&self) -> MatchPos {
        MatchPos::default()
    }

    /// The cursor at the end of the expression, before any node was matched
    /// from the back.
    pub fn end(&self) -> MatchPos {
        MatchPos::new(self.elements.len().saturating_sub(1), 0)
    }

    fn extra(bound: Option<MatchPos>, index: usize) -> usize {
        match bound {
            Some(b) if b.index == index => b.count,
            _ => 0,
        }
    }

    /// Match the children of `fragment` from the front, starting at `pos`.
    /// When `bound` is given, matching doesn't move past its element, and
    /// its count is added to the nodes matched by that element.
    pub fn match_forward(
        &self,
        attrs: &Attrs,
        fragment: &Fragment,
        pos: MatchPos,
        bound: Option<MatchPos>,
    ) -> Option<MatchPos> {
        if self.elements.is_empty() {
            return (fragment.child_count() == 0).then(|| pos);
        }
        let last = bound.map_or(self.elements.len() - 1, |b| b.index);
        let mut pos = pos;
        for child in fragment.iter() {
            loop {
                let elt = self.elements.get(pos.index)?;
                let taken = pos.count + Self::extra(bound, pos.index);
                if elt.matches_node(child) && elt.accepts_more(attrs, taken) {
                    pos.count += 1;
                    break;
                }
                if pos.index < last && elt.satisfied(attrs, pos.count) {
                    pos = MatchPos::new(pos.index + 1, 0);
                } else {
                    return None;
                }
            }
        }
        Some(pos)
    }

    /// Match the children of `fragment` from the back, starting at `pos`
    /// (usually [`ContentExpr::end`]). When `bound` is given, matching
    /// doesn't move before its element, and its count is added to the nodes
    /// matched by that element.
    pub fn match_backward(
        &self,
        attrs: &Attrs,
        fragment: &Fragment,
        pos: MatchPos,
        bound: Option<MatchPos>,
    ) -> Option<MatchPos> {
        if self.elements.is_empty() {
            return (fragment.child_count() == 0).then(|| pos);
        }
        let first = bound.map_or(0, |b| b.index);
        let mut pos = pos;
        for child in fragment.reverse_iter() {
            loop {
                let elt = self.elements.get(pos.index)?;
                let taken = pos.count + Self::extra(bound, pos.index);
                if elt.matches_node(child) && elt.accepts_more(attrs, taken) {
                    pos.count += 1;
                    break;
                }
                if pos.index > first && elt.satisfied(attrs, pos.count) {
                    pos = MatchPos::new(pos.index - 1, 0);
                } else {
                    return None;
                }
            }
        }
        Some(pos)
    }

    /// True when the cursor (after matching all content) ends the expression
    pub fn valid_end(&self, attrs: &Attrs, pos: MatchPos) -> bool {
        match self.elements.get(pos.index) {
            None => self.elements.is_empty(),
            Some(elt) => {
                elt.satisfied(attrs, pos.count)
                    && self.elements[pos.index + 1..]
                        .iter()
                        .all(|e| e.satisfied(attrs, 0))
            }
        }
    }

    /// Whether the fragment is valid content for a node with these attributes
    pub fn matches(&self, attrs: &Attrs, fragment: &Fragment) -> bool {
        self.match_forward(attrs, fragment, self.start(), None)
            .map_or(false, |pos| self.valid_end(attrs, pos))
    }

    /// The node types that could be inserted at the given cursor.
    pub fn possible_types(&self, attrs: &Attrs, pos: MatchPos) -> Vec<NodeType> {
        let schema = match self.schema() {
            Some(schema) => schema,
            None => return Vec::new(),
        };
        let mut found = Vec::new();
        let mut count = pos.count;
        for elt in self.elements.iter().skip(pos.index) {
            if elt.accepts_more(attrs, count) {
                for &t in &elt.node_types {
                    if !found.contains(&t) {
                        found.push(t);
                    }
                }
            }
            if !elt.satisfied(attrs, count) {
                break;
            }
            count = 0;
        }
        found.into_iter().map(|t| schema.node_type_at(t)).collect()
    }

    fn fill_between(
        &self,
        attrs: &Attrs,
        from: MatchPos,
        to: MatchPos,
        stack: &mut Vec<usize>,
    ) -> Option<Fragment> {
        if self.elements.is_empty() {
            return Some(Fragment::new());
        }
        if from.index > to.index {
            return None;
        }
        let schema = self.schema()?;
        let mut nodes = Vec::new();
        for index in from.index..=to.index {
            let elt = &self.elements[index];
            let mut count = 0;
            if index == from.index {
                count += from.count;
            }
            if index == to.index {
                count += to.count;
            }
            for _ in 0..elt.needed(attrs, count)? {
                nodes.push(elt.create_filler(&schema, stack)?);
            }
        }
        Some(Fragment::from(nodes))
    }

    /// Find the nodes that have to be inserted between `before` and `after`
    /// to make them valid content. Returns `None` when that isn't possible.
    pub fn fill_two_way(
        &self,
        attrs: &Attrs,
        before: &Fragment,
        after: &Fragment,
    ) -> Option<Fragment> {
        let front = self.match_forward(attrs, before, self.start(), None)?;
        let back = self.match_backward(attrs, after, self.end(), Some(front))?;
        self.fill_between(attrs, front, back, &mut Vec::new())
    }

    /// The minimal valid content for a node with these attributes.
    pub(crate) fn fill_empty(&self, attrs: &Attrs, stack: &mut Vec<usize>) -> Option<Fragment> {
        self.fill_between(attrs, self.start(), self.end(), stack)
    }

    /// Find two fragments that, placed around `mid`, make `before`, `mid`
    /// and `after` valid content. `mid` itself is kept as is.
    pub fn fill_three_way(
        &self,
        attrs: &Attrs,
        before: &Fragment,
        mid: &Fragment,
        after: &Fragment,
    ) -> Option<(Fragment, Fragment)> {
        let mut front = self.match_forward(attrs, before, self.start(), None)?;
        let back = self.match_backward(attrs, after, self.end(), Some(front))?;
        let mut stack = Vec::new();
        let mut left = Vec::new();
        loop {
            if let Some(end) = self.match_forward(attrs, mid, front, Some(back)) {
                if let Some(right) = self.fill_between(attrs, end, back, &mut stack) {
                    return Some((Fragment::from(left), right));
                }
            }
            front = self.fill_one(attrs, front, back, &mut left, &mut stack)?;
        }
    }

    /// Relax the front cursor by one step: add a filler when its element
    /// still needs nodes, move to the next element otherwise. Every step
    /// either brings the element closer to being satisfied or moves towards
    /// `back`, so repeated calls end in `None` eventually.
    fn fill_one(
        &self,
        attrs: &Attrs,
        front: MatchPos,
        back: MatchPos,
        left: &mut Vec<Node>,
        stack: &mut Vec<usize>,
    ) -> Option<MatchPos> {
        let elt = self.elements.get(front.index)?;
        let taken = front.count + Self::extra(Some(back), front.index);
        if elt.needed(attrs, taken)? > 0 {
            let schema = self.schema()?;
            let filler = elt.create_filler(&schema, stack)?;
            tracing::trace!(filler = %filler.r#type(), index = front.index, "fill one");
            left.push(filler);
            Some(MatchPos::new(front.index, front.count + 1))
        } else if front.index < back.index {
            tracing::trace!(index = front.index + 1, "fill one: next element");
            Some(MatchPos::new(front.index + 1, 0))
        } else {
            None
        }
    }
}

impl fmt::Debug for ContentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentExpr")
            .field("elements", &self.elements)
            .field("inline", &self.inline)
            .finish()
    }
}

impl PartialEq for ContentExpr {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements && Weak::ptr_eq(&self.schema, &other.schema)
    }
}
