//! # Helpers
//!
//! This module contains some functions to create nodes of the [basic
//! schema](crate::schema) programmatically.
//!
//! The builders panic when the resulting node can't be created (e.g. a
//! missing required attribute). Their content is not checked, so invalid
//! documents can be built on purpose.
//!
//! See also: <https://github.com/prosemirror/prosemirror-test-builder>
use crate::{schema, to_attrs, HeadingAttrs, ImageAttrs, LinkAttrs, OrderedListAttrs};
use prosemirror_model::{Attrs, Fragment, Mark, MarkSet, Node};

/// Values that can be turned into the content of a node
pub trait IntoFragment {
    /// Convert into a fragment
    fn into_fragment(self) -> Fragment;
}

impl IntoFragment for Fragment {
    fn into_fragment(self) -> Fragment {
        self
    }
}

impl IntoFragment for &str {
    fn into_fragment(self) -> Fragment {
        if self.is_empty() {
            Fragment::new()
        } else {
            Fragment::from(text(self))
        }
    }
}

impl IntoFragment for Node {
    fn into_fragment(self) -> Fragment {
        Fragment::from(self)
    }
}

impl IntoFragment for Vec<Node> {
    fn into_fragment(self) -> Fragment {
        Fragment::from(self)
    }
}

impl<A> IntoFragment for (A,)
where
    A: IntoFragment,
{
    fn into_fragment(self) -> Fragment {
        self.0.into_fragment()
    }
}

impl<A, B> IntoFragment for (A, B)
where
    A: IntoFragment,
    B: IntoFragment,
{
    fn into_fragment(self) -> Fragment {
        self.0.into_fragment().append(self.1.into_fragment())
    }
}

impl<A, B, C> IntoFragment for (A, B, C)
where
    A: IntoFragment,
    B: IntoFragment,
    C: IntoFragment,
{
    fn into_fragment(self) -> Fragment {
        (self.0, self.1)
            .into_fragment()
            .append(self.2.into_fragment())
    }
}

/// Create a node of the named type.
pub fn node<A: IntoFragment>(name: &str, attrs: Option<&Attrs>, content: A) -> Node {
    schema()
        .node(name, attrs, content.into_fragment(), MarkSet::default())
        .unwrap_or_else(|e| panic!("cannot build `{}`: {}", name, e))
}

fn mark(name: &str, attrs: Option<&Attrs>) -> Mark {
    schema()
        .mark(name, attrs)
        .unwrap_or_else(|e| panic!("cannot build mark `{}`: {}", name, e))
}

fn marked(content: &str, marks: MarkSet) -> Node {
    schema()
        .text(content, marks)
        .unwrap_or_else(|e| panic!("cannot build text {:?}: {}", content, e))
}

/// Create a plain text node.
pub fn text(content: &str) -> Node {
    marked(content, MarkSet::default())
}

/// Create a document node.
pub fn doc<A: IntoFragment>(content: A) -> Node {
    node("doc", None, content)
}

/// Create a paragraph node.
pub fn p<A: IntoFragment>(content: A) -> Node {
    node("paragraph", None, content)
}

/// Create a blockquote node.
pub fn blockquote<A: IntoFragment>(content: A) -> Node {
    node("blockquote", None, content)
}

/// Create a heading node.
pub fn h<A: IntoFragment>(level: u8, content: A) -> Node {
    let attrs = to_attrs(&HeadingAttrs { level }).ok();
    node("heading", attrs.as_ref(), content)
}

/// Create a heading (level 1) node.
pub fn h1<A: IntoFragment>(content: A) -> Node {
    h(1, content)
}

/// Create a heading (level 2) node.
pub fn h2<A: IntoFragment>(content: A) -> Node {
    h(2, content)
}

/// Create a code block node.
pub fn code_block<A: IntoFragment>(content: A) -> Node {
    node("code_block", None, content)
}

/// Create a horizontal line.
pub fn hr() -> Node {
    node("horizontal_rule", None, Fragment::new())
}

/// Create a hard break.
pub fn br() -> Node {
    node("hard_break", None, Fragment::new())
}

/// Create an image.
pub fn img(src: &str) -> Node {
    let attrs = to_attrs(&ImageAttrs {
        src: src.to_owned(),
        alt: String::new(),
        title: String::new(),
    })
    .ok();
    node("image", attrs.as_ref(), Fragment::new())
}

/// Create a list item node.
pub fn li<A: IntoFragment>(content: A) -> Node {
    node("list_item", None, content)
}

/// Create a bullet list node.
pub fn ul<A: IntoFragment>(content: A) -> Node {
    node("bullet_list", None, content)
}

/// Create an ordered list node.
pub fn ol<A: IntoFragment>(order: usize, content: A) -> Node {
    let attrs = to_attrs(&OrderedListAttrs { order }).ok();
    node("ordered_list", attrs.as_ref(), content)
}

/// Create an emphasized text node.
pub fn em(content: &str) -> Node {
    marked(content, mark("em", None).to_set())
}

/// Create a strong text node.
pub fn strong(content: &str) -> Node {
    marked(content, mark("strong", None).to_set())
}

/// Create a code text node.
pub fn code(content: &str) -> Node {
    marked(content, mark("code", None).to_set())
}

/// Create a linked text node.
pub fn a(href: &str, content: &str) -> Node {
    let attrs = to_attrs(&LinkAttrs {
        href: href.to_owned(),
        title: String::new(),
    })
    .ok();
    marked(content, mark("link", attrs.as_ref()).to_set())
}
