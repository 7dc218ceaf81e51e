use prosemirror_model::{InsertError, Node, ReplaceError, ResolveErr, SliceError};
use displaydoc::Display;
use thiserror::Error;

/// Different ways a step application can fail
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StepError {
    /// Structure replace would overwrite content
    WouldOverwrite,
    /// Structure gap-replace would overwrite content
    GapWouldOverwrite,
    /// Gap is not a flat range
    GapNotFlat,
    /// Content does not fit in gap
    GapNotFit,
    /// Invalid indices: {0}
    Resolve(#[from] ResolveErr),
    /// Invalid replace: {0}
    Replace(#[from] ReplaceError),
    /// Invalid slice: {0}
    Slice(#[from] SliceError),
    /// Insert error: {0}
    Insert(#[from] InsertError),
}

/// The result of [applying](StepKind::apply) a step. Contains either a
/// new document or a failure value.
pub type StepResult = Result<Node, StepError>;

/// A step object represents an atomic change.
///
/// It generally applies only to the document it was created for, since the positions
/// stored in it will only make sense for that document.
pub trait StepKind {
    /// Applies this step to the given document, returning a result
    /// object that either indicates failure, if the step can not be
    /// applied to this document, or indicates success by containing a
    /// transformed document.
    fn apply(&self, doc: &Node) -> StepResult;
}
