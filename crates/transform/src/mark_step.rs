use super::{util::Span, StepKind, StepResult};
use prosemirror_model::{Fragment, Mark, Node, Slice};
use serde::Serialize;

/// Map the inline nodes of a fragment, passing each one together with
/// its parent node.
fn map_fragment<F>(fragment: &Fragment, f: &F, parent: &Node) -> Fragment
where
    F: Fn(Node, &Node) -> Node,
{
    fragment
        .iter()
        .map(|child| {
            let mapped = child.copy(|c| map_fragment(c, f, child));
            if mapped.is_inline() {
                f(mapped, parent)
            } else {
                mapped
            }
        })
        .collect()
}

/// Adding a mark on some part of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMarkStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// The mark to add
    pub mark: Mark,
}

/// Removing a mark on some part of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMarkStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// The mark to remove
    pub mark: Mark,
}

impl StepKind for AddMarkStep {
    fn apply(&self, doc: &Node) -> StepResult {
        let old_slice = doc.slice(self.span.from..self.span.to, false)?;
        let rp_from = doc.resolve(self.span.from)?;
        let parent = rp_from.node(rp_from.shared_depth(self.span.to));

        let new_content = map_fragment(
            &old_slice.content,
            &|node, parent| {
                if parent.r#type().allows_mark_type(self.mark.r#type()) {
                    node.mark(self.mark.add_to_set(node.marks()).into_owned())
                } else {
                    node
                }
            },
            parent,
        );

        let slice = Slice::new(new_content, old_slice.open_start, old_slice.open_end);
        let new_node = doc.replace(self.span.from..self.span.to, &slice)?;
        Ok(new_node)
    }
}

impl StepKind for RemoveMarkStep {
    fn apply(&self, doc: &Node) -> StepResult {
        let old_slice = doc.slice(self.span.from..self.span.to, false)?;
        let rp_from = doc.resolve(self.span.from)?;
        let parent = rp_from.node(rp_from.shared_depth(self.span.to));

        let new_content = map_fragment(
            &old_slice.content,
            &|node, _| node.mark(self.mark.remove_from_set(node.marks()).into_owned()),
            parent,
        );

        let slice = Slice::new(new_content, old_slice.open_start, old_slice.open_end);
        let new_node = doc.replace(self.span.from..self.span.to, &slice)?;
        Ok(new_node)
    }
}
