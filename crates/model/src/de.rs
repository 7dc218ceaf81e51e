//! # SerDe Utilities

use serde::de::{Deserialize, Deserializer};

/// Deserialize a field that is present as `Some`, even when its value is `null`.
///
/// Combined with `#[serde(default)]`, this distinguishes a missing field from an
/// explicit `null`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
