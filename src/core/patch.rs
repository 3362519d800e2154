use serde::{Deserialize, Deserializer};

/// Three-state wrapper for PATCH-style request fields.
///
/// Distinguishes a field that was absent from the payload (`Missing`, leave
/// the stored value unchanged) from one that was present as JSON `null`
/// (`Null`, clear a nullable field) and from a concrete value (`Value`,
/// overwrite — including empty strings and empty lists).
///
/// Fields must be declared with `#[serde(default)]` so that absence
/// deserializes to `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// The concrete value, if one was supplied.
    pub fn value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}
