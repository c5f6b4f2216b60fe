//! Raw and resolved hardpoint values.

use serde_json::Value;
use std::sync::Arc;

use crate::record::RemoteRecord;
use crate::reference::{downcast_handle, same_object, RefHandle, RefType};

/// What a loader hands back for one ref, before template conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Plain value, stored as-is
    Scalar(Value),
    /// At most one related record
    Record(Option<RemoteRecord>),
    /// Related records, in source order
    Records(Vec<RemoteRecord>),
}

/// A resolved hardpoint value.
#[derive(Debug, Clone)]
pub enum HardpointValue {
    Scalar(Value),
    Object(Option<RefHandle>),
    ObjectList(Vec<RefHandle>),
}

impl HardpointValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            HardpointValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// `Some(None)` means the relationship resolved to nothing.
    pub fn as_object(&self) -> Option<Option<&RefHandle>> {
        match self {
            HardpointValue::Object(handle) => Some(handle.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RefHandle]> {
        match self {
            HardpointValue::ObjectList(handles) => Some(handles),
            _ => None,
        }
    }

    /// Typed view of a single-object value.
    pub fn object<T: RefType>(&self) -> Option<Arc<T>> {
        self.as_object().flatten().and_then(downcast_handle::<T>)
    }

    /// Typed view of an object list; refs of another type are skipped.
    pub fn objects<T: RefType>(&self) -> Vec<Arc<T>> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(downcast_handle::<T>)
            .collect()
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            HardpointValue::Scalar(_) => "scalar",
            HardpointValue::Object(_) => "object",
            HardpointValue::ObjectList(_) => "object list",
        }
    }
}

impl PartialEq for HardpointValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HardpointValue::Scalar(a), HardpointValue::Scalar(b)) => a == b,
            (HardpointValue::Object(a), HardpointValue::Object(b)) => match (a, b) {
                (Some(a), Some(b)) => same_object(a, b),
                (None, None) => true,
                _ => false,
            },
            (HardpointValue::ObjectList(a), HardpointValue::ObjectList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_object(a, b))
            }
            _ => false,
        }
    }
}
