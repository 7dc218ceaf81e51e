use crate::content::{ContentExpr, SyntaxError};
use crate::{de, parse, Fragment, Mark, MarkSet, Node};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// The attributes of a node or mark.
pub type Attrs = BTreeMap<String, Value>;

/// Errors when building a schema or creating nodes and marks from it
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SchemaError {
    /// {0}
    Syntax(#[from] SyntaxError),
    /// Duplicate node type `{0}`
    DuplicateNode(String),
    /// Duplicate mark type `{0}`
    DuplicateMark(String),
    /// Unknown node type `{0}`
    UnknownNode(String),
    /// Unknown mark type `{0}`
    UnknownMark(String),
    /// Schema is missing its top node type `{0}`
    MissingTopNode(String),
    /// No value supplied for attribute `{attr}` of `{name}`
    MissingAttr {
        /// The node or mark type
        name: String,
        /// The attribute without a value
        attr: String,
    },
    /// Empty text nodes are not allowed
    EmptyText,
    /// The schema has no `text` node type
    NoTextType,
    /// Text nodes can only be created with `Schema::text`
    TextCreate,
    /// Leaf node `{0}` cannot have content
    LeafContent(String),
    /// Invalid content for node `{0}`
    InvalidContent(String),
}

/// The description of an attribute.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AttrSpec {
    /// The default value. An attribute without a default is required.
    #[serde(
        default,
        deserialize_with = "de::deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

impl AttrSpec {
    /// An attribute that must be supplied whenever a node is created
    pub fn required() -> Self {
        Self { default: None }
    }

    /// An attribute with a default value
    pub fn with_default<V: Into<Value>>(value: V) -> Self {
        Self {
            default: Some(value.into()),
        }
    }
}

/// The description of a node type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeSpec {
    /// The name of the node type
    pub name: String,
    /// The content expression. Nodes without one are leaves.
    #[serde(default)]
    pub content: Option<String>,
    /// Space-separated groups this type belongs to
    #[serde(default)]
    pub group: Option<String>,
    /// Whether this is an inline type. The `text` type is always inline.
    #[serde(default)]
    pub inline: bool,
    /// Whether this node is treated as a single unit, even if it has content
    #[serde(default)]
    pub atom: bool,
    /// The attributes of nodes of this type
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrSpec>,
}

impl NodeSpec {
    /// A node spec with just a name
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the content expression
    pub fn content<E: Into<String>>(mut self, expr: E) -> Self {
        self.content = Some(expr.into());
        self
    }

    /// Set the groups
    pub fn group<G: Into<String>>(mut self, group: G) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Mark the type as inline
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    /// Mark the type as atom
    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    /// Add an attribute
    pub fn attr<N: Into<String>>(mut self, name: N, spec: AttrSpec) -> Self {
        self.attrs.insert(name.into(), spec);
        self
    }
}

/// The description of a mark type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MarkSpec {
    /// The name of the mark type
    pub name: String,
    /// Space-separated groups this mark belongs to
    #[serde(default)]
    pub group: Option<String>,
    /// The attributes of marks of this type
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrSpec>,
}

impl MarkSpec {
    /// A mark spec with just a name
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the groups
    pub fn group<G: Into<String>>(mut self, group: G) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Add an attribute
    pub fn attr<N: Into<String>>(mut self, name: N, spec: AttrSpec) -> Self {
        self.attrs.insert(name.into(), spec);
        self
    }
}

/// The description of a whole schema. Node and mark types keep their order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    /// The node types
    pub nodes: Vec<NodeSpec>,
    /// The mark types, in order of precedence
    #[serde(default)]
    pub marks: Vec<MarkSpec>,
    /// The name of the top node type, `doc` by default
    #[serde(default)]
    pub top_node: Option<String>,
}

#[derive(Debug)]
pub(crate) struct TypeEntry {
    pub name: String,
    pub groups: Vec<String>,
    pub inline: bool,
}

/// Names of node and mark types, used to compile content expressions
#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    pub nodes: Vec<TypeEntry>,
    pub marks: Vec<TypeEntry>,
    node_names: HashMap<String, usize>,
    mark_names: HashMap<String, usize>,
}

impl TypeTable {
    /// The node types that a name in a content expression refers to.
    pub fn find_nodes(&self, name: &str) -> Vec<usize> {
        find(&self.nodes, &self.node_names, name)
    }

    /// The mark types that a name in a mark set refers to.
    pub fn find_marks(&self, name: &str) -> Vec<usize> {
        find(&self.marks, &self.mark_names, name)
    }
}

fn find(entries: &[TypeEntry], names: &HashMap<String, usize>, name: &str) -> Vec<usize> {
    if let Some(index) = names.get(name) {
        return vec![*index];
    }
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.groups.iter().any(|g| g == name))
        .map(|(i, _)| i)
        .collect()
}

fn split_groups(group: &Option<String>) -> Vec<String> {
    group
        .as_deref()
        .map(|g| g.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

pub(crate) struct NodeTypeData {
    pub name: String,
    pub text: bool,
    pub atom: bool,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub content: ContentExpr,
}

pub(crate) struct MarkTypeData {
    pub name: String,
    pub attrs: BTreeMap<String, AttrSpec>,
}

pub(crate) struct SchemaInner {
    pub table: TypeTable,
    pub nodes: Vec<NodeTypeData>,
    pub marks: Vec<MarkTypeData>,
    pub top_node: usize,
    pub text: Option<usize>,
}

/// A document schema. Holds node and mark types, and can create and check
/// documents that conform to it.
///
/// This is a shared handle, cloning it is cheap.
#[derive(Clone)]
pub struct Schema(pub(crate) Arc<SchemaInner>);

impl Schema {
    /// Compile a schema from its spec.
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        let mut table = TypeTable::default();

        for mark in &spec.marks {
            if table.mark_names.contains_key(&mark.name) {
                return Err(SchemaError::DuplicateMark(mark.name.clone()));
            }
            table.mark_names.insert(mark.name.clone(), table.marks.len());
            table.marks.push(TypeEntry {
                name: mark.name.clone(),
                groups: split_groups(&mark.group),
                inline: false,
            });
        }

        for node in &spec.nodes {
            if table.node_names.contains_key(&node.name) {
                return Err(SchemaError::DuplicateNode(node.name.clone()));
            }
            table.node_names.insert(node.name.clone(), table.nodes.len());
            table.nodes.push(TypeEntry {
                name: node.name.clone(),
                groups: split_groups(&node.group),
                inline: node.inline || node.name == "text",
            });
        }

        let top_name = spec.top_node.as_deref().unwrap_or("doc");
        let top_node = *table
            .node_names
            .get(top_name)
            .ok_or_else(|| SchemaError::MissingTopNode(top_name.to_owned()))?;
        let text = table.node_names.get("text").copied();

        let mut parsed = Vec::with_capacity(spec.nodes.len());
        for node in &spec.nodes {
            let expr = node.content.as_deref().unwrap_or("");
            parsed.push(parse::parse(&table, &node.name, &node.attrs, expr)?);
        }
        if text.is_none() && parsed.iter().any(|expr| expr.inline) {
            return Err(SchemaError::NoTextType);
        }

        let inner = Arc::new_cyclic(|schema| SchemaInner {
            nodes: spec
                .nodes
                .into_iter()
                .zip(parsed)
                .map(|(node, expr)| NodeTypeData {
                    text: node.name == "text",
                    name: node.name,
                    atom: node.atom,
                    attrs: node.attrs,
                    content: ContentExpr::new(schema.clone(), expr),
                })
                .collect(),
            marks: spec
                .marks
                .into_iter()
                .map(|mark| MarkTypeData {
                    name: mark.name,
                    attrs: mark.attrs,
                })
                .collect(),
            table,
            top_node,
            text,
        });

        tracing::debug!(
            nodes = inner.nodes.len(),
            marks = inner.marks.len(),
            top = top_name,
            "compiled schema"
        );
        Ok(Schema(inner))
    }

    pub(crate) fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Get the node type with the given name
    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.0.table.node_names.get(name).map(|&index| NodeType {
            schema: self.clone(),
            index,
        })
    }

    /// Get the mark type with the given name
    pub fn mark_type(&self, name: &str) -> Option<MarkType> {
        self.0.table.mark_names.get(name).map(|&index| MarkType {
            schema: self.clone(),
            index,
        })
    }

    /// All node types, in declaration order
    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        (0..self.0.nodes.len()).map(move |index| NodeType {
            schema: self.clone(),
            index,
        })
    }

    /// All mark types, in order of rank
    pub fn mark_types(&self) -> impl Iterator<Item = MarkType> + '_ {
        (0..self.0.marks.len()).map(move |index| MarkType {
            schema: self.clone(),
            index,
        })
    }

    /// The type of the document root
    pub fn top_node_type(&self) -> NodeType {
        NodeType {
            schema: self.clone(),
            index: self.0.top_node,
        }
    }

    pub(crate) fn node_type_at(&self, index: usize) -> NodeType {
        NodeType {
            schema: self.clone(),
            index,
        }
    }

    /// Create a node of the named type. Does not check the content.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: MarkSet,
    ) -> Result<Node, SchemaError> {
        let node_type = self
            .node_type(name)
            .ok_or_else(|| SchemaError::UnknownNode(name.to_owned()))?;
        node_type.create(attrs, content, marks)
    }

    /// Create a text node.
    pub fn text<T: Into<String>>(&self, text: T, marks: MarkSet) -> Result<Node, SchemaError> {
        let index = self.0.text.ok_or(SchemaError::NoTextType)?;
        let text = text.into();
        if text.is_empty() {
            return Err(SchemaError::EmptyText);
        }
        Ok(Node::new_text(self.node_type_at(index), text.into(), marks))
    }

    /// Create a mark of the named type.
    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> Result<Mark, SchemaError> {
        let mark_type = self
            .mark_type(name)
            .ok_or_else(|| SchemaError::UnknownMark(name.to_owned()))?;
        mark_type.create(attrs)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.0.nodes.iter().map(|n| &n.name).collect::<Vec<_>>())
            .field("marks", &self.0.marks.iter().map(|m| &m.name).collect::<Vec<_>>())
            .finish()
    }
}

fn compute_attrs(
    name: &str,
    specs: &BTreeMap<String, AttrSpec>,
    given: Option<&Attrs>,
) -> Result<Attrs, SchemaError> {
    let mut attrs = Attrs::new();
    for (attr, spec) in specs {
        let value = given
            .and_then(|g| g.get(attr))
            .or_else(|| spec.default.as_ref())
            .cloned()
            .ok_or_else(|| SchemaError::MissingAttr {
                name: name.to_owned(),
                attr: attr.clone(),
            })?;
        attrs.insert(attr.clone(), value);
    }
    Ok(attrs)
}

/// A node type of a schema. Every node has a type, which names it and
/// determines its content and attributes.
#[derive(Clone)]
pub struct NodeType {
    schema: Schema,
    index: usize,
}

impl NodeType {
    pub(crate) fn data(&self) -> &NodeTypeData {
        &self.schema.0.nodes[self.index]
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// The name of the node type
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// The schema this type belongs to
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The groups of this type
    pub fn groups(&self) -> &[String] {
        &self.schema.0.table.nodes[self.index].groups
    }

    /// The compiled content expression
    pub fn content_expr(&self) -> &ContentExpr {
        &self.data().content
    }

    /// True for the `text` type
    pub fn is_text(&self) -> bool {
        self.data().text
    }

    /// True for inline types
    pub fn is_inline(&self) -> bool {
        self.schema.0.table.nodes[self.index].inline
    }

    /// True for block types, i.e. all non-inline types
    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    /// True for block types with inline content
    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.content_expr().inline_content()
    }

    /// True for types that allow no content
    pub fn is_leaf(&self) -> bool {
        self.content_expr().is_leaf()
    }

    /// True when this type is a leaf or marked as atom
    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.data().atom
    }

    /// True when some attribute has no default
    pub fn has_required_attrs(&self) -> bool {
        self.data().attrs.values().any(|spec| spec.default.is_none())
    }

    /// The default attributes, if there are no required ones
    pub fn default_attrs(&self) -> Option<Attrs> {
        self.compute_attrs(None).ok()
    }

    /// Fill in defaults for the given attributes, dropping unknown ones.
    pub fn compute_attrs(&self, attrs: Option<&Attrs>) -> Result<Attrs, SchemaError> {
        compute_attrs(self.name(), &self.data().attrs, attrs)
    }

    /// Create a node of this type. The content is not checked.
    pub fn create(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: MarkSet,
    ) -> Result<Node, SchemaError> {
        if self.is_text() {
            return Err(SchemaError::TextCreate);
        }
        let attrs = self.compute_attrs(attrs)?;
        if self.is_leaf() {
            if content.size() > 0 {
                return Err(SchemaError::LeafContent(self.name().to_owned()));
            }
            Ok(Node::new_atom(self.clone(), attrs, marks))
        } else {
            Ok(Node::new_branch(self.clone(), attrs, content, marks))
        }
    }

    /// Like [`NodeType::create`], but checks the content and marks against the schema.
    pub fn create_checked(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: MarkSet,
    ) -> Result<Node, SchemaError> {
        let node = self.create(attrs, content, marks)?;
        if self.valid_content(node.content(), node.attrs()) {
            Ok(node)
        } else {
            Err(SchemaError::InvalidContent(self.name().to_owned()))
        }
    }

    /// Create a node of this type, appending the nodes required to make the
    /// given content valid. Returns `None` when no such nodes can be made or
    /// when a required attribute is missing.
    pub fn create_and_fill(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: MarkSet,
    ) -> Option<Node> {
        let attrs = self.compute_attrs(attrs).ok()?;
        let after = self
            .content_expr()
            .fill_two_way(&attrs, &content, Fragment::EMPTY_REF)?;
        self.create(Some(&attrs), content.append(after), marks).ok()
    }

    /// Create an instance with default attributes and minimal content.
    /// `stack` holds the types currently being filled.
    pub(crate) fn create_filler(&self, stack: &mut Vec<usize>) -> Option<Node> {
        if self.is_text() || stack.contains(&self.index) {
            return None;
        }
        let attrs = self.default_attrs()?;
        stack.push(self.index);
        let content = self.content_expr().fill_empty(&attrs, stack);
        stack.pop();
        self.create(Some(&attrs), content?, MarkSet::default()).ok()
    }

    /// Returns true if the given fragment is valid content for this node type with the given
    /// attributes.
    pub fn valid_content(&self, content: &Fragment, attrs: &Attrs) -> bool {
        self.content_expr().matches(attrs, content)
    }

    /// Whether nodes of this type can take over the content of nodes of the
    /// other type: every node type (with its marks) that `other` allows is
    /// also allowed here.
    pub fn can_contain_content(&self, other: &NodeType) -> bool {
        if self == other {
            return true;
        }
        let mine = self.content_expr().elements();
        other.content_expr().elements().iter().all(|theirs| {
            theirs.node_types().iter().all(|t| {
                mine.iter()
                    .any(|e| e.node_types().contains(t) && e.marks().covers(theirs.marks()))
            })
        })
    }

    /// True when inline content of this type may carry marks of the given type
    pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
        self.content_expr()
            .elements()
            .iter()
            .any(|e| e.marks().allows(mark_type.index))
    }

    /// True when every mark of the set is allowed in this type's content
    pub fn allows_marks(&self, marks: &MarkSet) -> bool {
        marks.iter().all(|m| self.allows_mark_type(m.r#type()))
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.schema.ptr_eq(&other.schema)
    }
}

impl Eq for NodeType {}

impl Hash for NodeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.schema.0).hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Like nodes, marks (which are associated with nodes to signify
/// things like emphasis or being part of a link) are
/// tagged with type objects, which are instantiated once per `Schema`.
#[derive(Clone)]
pub struct MarkType {
    schema: Schema,
    index: usize,
}

impl MarkType {
    fn data(&self) -> &MarkTypeData {
        &self.schema.0.marks[self.index]
    }

    /// The name of the mark type
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// The schema this type belongs to
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The precedence of the type; mark sets are sorted by rank
    pub fn rank(&self) -> usize {
        self.index
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Create a mark of this type
    pub fn create(&self, attrs: Option<&Attrs>) -> Result<Mark, SchemaError> {
        let attrs = compute_attrs(self.name(), &self.data().attrs, attrs)?;
        Ok(Mark::new(self.clone(), attrs))
    }

    /// The mark of this type in the given set, if any
    pub fn is_in_set<'a>(&self, set: &'a MarkSet) -> Option<&'a Mark> {
        set.iter().find(|m| m.r#type() == self)
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.schema.ptr_eq(&other.schema)
    }
}

impl Eq for MarkType {}

impl Hash for MarkType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.schema.0).hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
