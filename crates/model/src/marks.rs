use crate::{Attrs, MarkType};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::slice;

/// A mark is a piece of information that can be attached to a node, such as it being emphasized,
/// in code font, or a link. It has a type and optionally a set of attributes that provide further
/// information (such as the target of the link).
#[derive(Clone, PartialEq, Eq)]
pub struct Mark {
    r#type: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(r#type: MarkType, attrs: Attrs) -> Self {
        Self { r#type, attrs }
    }

    /// The type of this mark
    pub fn r#type(&self) -> &MarkType {
        &self.r#type
    }

    /// The attributes of this mark
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Given a set of marks, create a new set which contains this one as well, in the right
    /// position. If this mark is already in the set, the set itself is returned. If any marks that
    /// are set to be exclusive with this mark are present, those are replaced by this one.
    pub fn add_to_set<'a>(&self, set: &'a MarkSet) -> Cow<'a, MarkSet> {
        let rank = self.r#type.rank();
        let mut marks = Vec::with_capacity(set.len() + 1);
        let mut placed = false;
        for other in set.iter() {
            if other == self {
                return Cow::Borrowed(set);
            }
            if other.r#type == self.r#type {
                continue;
            }
            if !placed && other.r#type.rank() > rank {
                marks.push(self.clone());
                placed = true;
            }
            marks.push(other.clone());
        }
        if !placed {
            marks.push(self.clone());
        }
        Cow::Owned(MarkSet(marks))
    }

    /// Remove this mark from the given set, returning a new set. If this mark is not in the set,
    /// the set itself is returned.
    pub fn remove_from_set<'a>(&self, set: &'a MarkSet) -> Cow<'a, MarkSet> {
        match set.iter().position(|m| m == self) {
            Some(index) => {
                let mut marks = set.0.clone();
                marks.remove(index);
                Cow::Owned(MarkSet(marks))
            }
            None => Cow::Borrowed(set),
        }
    }

    /// Test whether this mark is in the given set of marks.
    pub fn is_in_set(&self, set: &MarkSet) -> bool {
        set.iter().any(|m| m == self)
    }

    /// A set containing just this mark
    pub fn to_set(&self) -> MarkSet {
        MarkSet(vec![self.clone()])
    }
}

impl Serialize for Mark {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.attrs.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", self.r#type.name())?;
        if !self.attrs.is_empty() {
            map.serialize_entry("attrs", &self.attrs)?;
        }
        map.end()
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.r#type.name())
        } else {
            write!(f, "{}{:?}", self.r#type.name(), self.attrs)
        }
    }
}

/// A set of marks, sorted by the rank of their type, with at most one mark per type.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    /// The empty set
    pub const NONE: MarkSet = MarkSet(Vec::new());

    /// Create a properly sorted set from a list of marks. When a type occurs
    /// more than once, the last mark of that type wins.
    pub fn from_marks<I: IntoIterator<Item = Mark>>(marks: I) -> Self {
        marks.into_iter().fold(MarkSet::default(), |set, mark| {
            mark.add_to_set(&set).into_owned()
        })
    }

    /// Iterate over the marks in rank order
    pub fn iter(&self) -> slice::Iter<'_, Mark> {
        self.0.iter()
    }

    /// The number of marks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no marks
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The marks as a slice
    pub fn as_slice(&self) -> &[Mark] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for MarkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
