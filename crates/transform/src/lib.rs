//! # The document transformations
//!
//! Steps are atomic changes to a document. Applying a step produces a new
//! document and leaves the old one untouched.
mod mark_step;
mod replace_step;
mod step;
mod util;

pub use mark_step::{AddMarkStep, RemoveMarkStep};
pub use replace_step::{ReplaceAroundStep, ReplaceStep};
pub use step::{StepError, StepKind, StepResult};
pub use util::Span;

use prosemirror_model::{JsonError, Mark, Node, Schema, Slice};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A list of steps
pub type Steps = Vec<Step>;

/// Steps that can be applied on a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Replace some content
    Replace(ReplaceStep),
    /// Replace around some content
    ReplaceAround(ReplaceAroundStep),
    /// Add a mark to a span
    AddMark(AddMarkStep),
    /// Remove a mark from a span
    RemoveMark(RemoveMarkStep),
}

impl Step {
    /// Apply the step to the given node
    pub fn apply(&self, doc: &Node) -> StepResult {
        let result = match self {
            Self::Replace(r_step) => r_step.apply(doc),
            Self::ReplaceAround(ra_step) => ra_step.apply(doc),
            Self::AddMark(am_step) => am_step.apply(doc),
            Self::RemoveMark(rm_step) => rm_step.apply(doc),
        };
        if let Err(e) = &result {
            tracing::debug!(error = %e, "step failed");
        }
        result
    }

    /// Read a step from its JSON representation. Slices and marks are
    /// resolved against the given schema.
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Step, JsonError> {
        let step = match RawStep::deserialize(value)? {
            RawStep::Replace(raw) => Step::Replace(ReplaceStep {
                span: raw.span,
                slice: Slice::from_json(schema, &raw.slice)?,
                structure: raw.structure,
            }),
            RawStep::ReplaceAround(raw) => Step::ReplaceAround(ReplaceAroundStep {
                span: raw.span,
                gap_from: raw.gap_from,
                gap_to: raw.gap_to,
                slice: Slice::from_json(schema, &raw.slice)?,
                insert: raw.insert,
                structure: raw.structure,
            }),
            RawStep::AddMark(raw) => Step::AddMark(AddMarkStep {
                span: raw.span,
                mark: Mark::from_json(schema, &raw.mark)?,
            }),
            RawStep::RemoveMark(raw) => Step::RemoveMark(RemoveMarkStep {
                span: raw.span,
                mark: Mark::from_json(schema, &raw.mark)?,
            }),
        };
        Ok(step)
    }

    /// The JSON representation of this step
    pub fn to_json(&self) -> Result<Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
enum RawStep {
    Replace(RawReplace),
    ReplaceAround(RawReplaceAround),
    AddMark(RawMarkStep),
    RemoveMark(RawMarkStep),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplace {
    #[serde(flatten)]
    span: Span,
    #[serde(default)]
    slice: Value,
    #[serde(default)]
    structure: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplaceAround {
    #[serde(flatten)]
    span: Span,
    gap_from: usize,
    gap_to: usize,
    #[serde(default)]
    slice: Value,
    insert: usize,
    #[serde(default)]
    structure: bool,
}

#[derive(Deserialize)]
struct RawMarkStep {
    #[serde(flatten)]
    span: Span,
    mark: Value,
}

#[cfg(test)]
mod tests {
    use super::{AddMarkStep, ReplaceStep, Span, Step};
    use prosemirror_model::{Fragment, JsonError, Slice};
    use prosemirror_schema_basic::helper::{doc, p, text};
    use prosemirror_schema_basic::schema;
    use serde_json::json;

    #[test]
    fn test_deserialize() {
        let schema = schema();
        let s1 = Step::from_json(
            schema,
            &json!({"stepType": "addMark", "mark": {"type": "em"}, "from": 61, "to": 648}),
        )
        .unwrap();

        assert_eq!(
            s1,
            Step::AddMark(AddMarkStep {
                span: Span { from: 61, to: 648 },
                mark: schema.mark("em", None).unwrap(),
            })
        );

        let s2 = Step::from_json(
            schema,
            &json!({"stepType": "replace", "from": 986, "to": 986, "slice": {"content": [{"type": "text", "text": "!"}]}}),
        )
        .unwrap();

        assert_eq!(
            s2,
            Step::Replace(ReplaceStep {
                span: Span { from: 986, to: 986 },
                slice: Slice {
                    content: Fragment::from(text("!")),
                    open_start: 0,
                    open_end: 0,
                },
                structure: false,
            })
        );
    }

    #[test]
    fn writes_steps() {
        let value = json!({
            "stepType": "replace",
            "from": 1,
            "to": 3,
            "slice": {"content": [{"type": "text", "text": "x"}]}
        });
        let step = Step::from_json(schema(), &value).unwrap();
        assert_eq!(step.to_json().unwrap(), value);
        assert_eq!(
            step.apply(&doc(vec![p("abc")])),
            Ok(doc(vec![p("xc")]))
        );
    }

    #[test]
    fn rejects_unknown_steps() {
        let unknown = Step::from_json(schema(), &json!({"stepType": "setAttr", "from": 1}));
        assert!(matches!(unknown, Err(JsonError::Serde(_))));
        let bad_mark = Step::from_json(
            schema(),
            &json!({"stepType": "removeMark", "mark": {"type": "blink"}, "from": 1, "to": 2}),
        );
        assert!(matches!(bad_mark, Err(JsonError::Schema(_))));
    }
}
