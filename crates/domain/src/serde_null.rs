//! Serde helper for canvas payloads where `null` means "not provided"

use serde::{Deserialize, Deserializer};

/// Deserialize a field, mapping JSON `null` to the type's default.
///
/// Use together with `#[serde(default)]` so an absent field behaves the same.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
