use crate::de;
use prosemirror_model::Attrs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attributes for a heading (i.e. `<h1>`, `<h2>`, ...)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeadingAttrs {
    /// The level of the heading (i.e. `1` for `<h1>`)
    pub level: u8,
}

/// Attributes for a code block
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodeBlockAttrs {
    /// The info string after the opening fence
    #[serde(default, deserialize_with = "de::deserialize_or_default")]
    pub params: String,
}

/// Attributes for an ordered list
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OrderedListAttrs {
    /// Initial value
    pub order: usize,
}

/// Attributes for an image
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageAttrs {
    /// Source URL
    pub src: String,
    #[serde(default, deserialize_with = "de::deserialize_or_default")]
    /// Alternative Text (Accessibility)
    pub alt: String,
    /// Title (Tooltip)
    #[serde(default, deserialize_with = "de::deserialize_or_default")]
    pub title: String,
}

/// The attributes for a hyperlink
#[derive(Debug, Hash, Eq, Clone, PartialEq, Deserialize, Serialize)]
pub struct LinkAttrs {
    /// The URL the link points to
    pub href: String,
    /// The title of the link
    #[serde(default, deserialize_with = "de::deserialize_or_default")]
    pub title: String,
}

/// Convert typed attributes into the attribute map of a node or mark.
pub fn to_attrs<T: Serialize>(attrs: &T) -> Result<Attrs, serde_json::Error> {
    match serde_json::to_value(attrs)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(serde::ser::Error::custom(format!(
            "attributes must be an object, got {}",
            other
        ))),
    }
}

/// Read typed attributes from the attribute map of a node or mark.
pub fn from_attrs<T: DeserializeOwned>(attrs: &Attrs) -> Result<T, serde_json::Error> {
    let map = attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    serde_json::from_value(Value::Object(map))
}
