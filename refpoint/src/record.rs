//! Raw remote records and identifiers
//!
//! A `RemoteRecord` is the parameter mapping a remote source returns for one
//! object. Refs own their record and only ever read from it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable, globally-unique object identifier (e.g. `PHID-HMBB-abcd`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phid(String);

impl Phid {
    pub fn new(phid: impl Into<String>) -> Self {
        Self(phid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four-letter type segment, if the PHID is well formed.
    ///
    /// `PHID-HMBD-1234` has type `HMBD`.
    pub fn phid_type(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("PHID"), Some(kind), Some(_)) if !kind.is_empty() => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for Phid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Phid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Phid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Immutable field mapping for one remote object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRecord(Map<String, Value>);

impl RemoteRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value; only objects are records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Nested lookup, e.g. `get_path(&["fields", "name"])`.
    ///
    /// Returns `None` as soon as any segment is absent or not an object.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Numeric field lookup that also accepts numeric strings.
    pub fn u64_at(&self, path: &[&str]) -> Option<u64> {
        match self.get_path(path)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Local numeric identifier (`id`).
    pub fn id(&self) -> Option<u64> {
        self.u64_at(&["id"])
    }

    /// Global identifier (`phid`).
    pub fn phid(&self) -> Option<Phid> {
        self.str_at(&["phid"]).map(Phid::from)
    }

    /// Decode a sub-mapping into a typed view, falling back to the default
    /// when the key is absent or has an unexpected shape.
    pub fn decode_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.0
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for RemoteRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
