use super::{Span, StepError, StepKind, StepResult};
use prosemirror_model::{Node, ResolveErr, Slice};
use serde::Serialize;

/// Replace some part of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStep {
    /// The affected span
    #[serde(flatten)]
    pub span: Span,
    /// The slice to replace the current content with
    pub slice: Slice,
    /// Whether this is a structural change
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub structure: bool,
}

impl StepKind for ReplaceStep {
    fn apply(&self, doc: &Node) -> StepResult {
        let from = self.span.from;
        let to = self.span.to;
        if self.structure && content_between(doc, from, to)? {
            Err(StepError::WouldOverwrite)
        } else {
            let node = doc.replace(from..to, &self.slice)?;
            Ok(node)
        }
    }
}

/// Replace the document structure while keeping some content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAroundStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// Start of the gap
    pub gap_from: usize,
    /// End of the gap
    pub gap_to: usize,
    /// The inner slice
    pub slice: Slice,
    /// Position in the slice where the gap content is inserted
    pub insert: usize,
    /// Whether this is a structural change
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub structure: bool,
}

impl StepKind for ReplaceAroundStep {
    fn apply(&self, doc: &Node) -> StepResult {
        if self.structure
            && (content_between(doc, self.span.from, self.gap_from)?
                || content_between(doc, self.gap_to, self.span.to)?)
        {
            return Err(StepError::GapWouldOverwrite);
        }

        let gap = doc.slice(self.gap_from..self.gap_to, false)?;
        if gap.open_start != 0 || gap.open_end != 0 {
            return Err(StepError::GapNotFlat);
        }

        let inserted = self.slice.insert_at(self.insert, gap.content)?;
        let inserted = inserted.ok_or(StepError::GapNotFit)?;

        let result = doc.replace(self.span.from..self.span.to, &inserted)?;
        Ok(result)
    }
}

/// True when the range between `from` and `to` holds more than the
/// boundaries of the nodes it crosses.
fn content_between(doc: &Node, from: usize, to: usize) -> Result<bool, ResolveErr> {
    let rp_from = doc.resolve(from)?;
    let mut dist = to.saturating_sub(from);
    let mut depth = rp_from.depth();
    while dist > 0 && depth > 0 && rp_from.index_after(depth) == rp_from.node(depth).child_count() {
        depth -= 1;
        dist -= 1;
    }
    if dist > 0 {
        let mut next = rp_from.node(depth).maybe_child(rp_from.index_after(depth));
        while dist > 0 {
            match next {
                Some(c) if !c.is_leaf() && !c.is_text() => {
                    next = c.first_child();
                    dist -= 1;
                }
                _ => return Ok(true),
            }
        }
    }
    Ok(false)
}
