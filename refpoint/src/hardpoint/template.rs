//! Value shapes a hardpoint can resolve to.

use std::fmt;
use std::sync::Arc;

use super::value::{HardpointValue, RawValue};
use crate::record::RemoteRecord;
use crate::reference::{RefHandle, RefType};

/// Builds refs of one type from raw records.
#[derive(Clone, Copy)]
pub struct RefFactory {
    ref_type: &'static str,
    build: fn(RemoteRecord) -> RefHandle,
}

fn build_handle<T: RefType>(record: RemoteRecord) -> RefHandle {
    Arc::new(T::new_from_remote(record))
}

impl RefFactory {
    pub fn of<T: RefType>() -> Self {
        Self {
            ref_type: T::REF_TYPE,
            build: build_handle::<T>,
        }
    }

    pub fn ref_type(&self) -> &'static str {
        self.ref_type
    }

    pub fn build(&self, record: RemoteRecord) -> RefHandle {
        (self.build)(record)
    }
}

impl fmt::Debug for RefFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefFactory").field(&self.ref_type).finish()
    }
}

/// Expected shape of a resolved hardpoint.
#[derive(Debug, Clone, Copy)]
pub enum Template {
    /// Any JSON value
    Scalar,
    /// Zero or one ref
    Object(RefFactory),
    /// Ordered refs, kept in source order
    ObjectList(RefFactory),
}

impl Template {
    pub fn scalar() -> Self {
        Template::Scalar
    }

    pub fn object<T: RefType>() -> Self {
        Template::Object(RefFactory::of::<T>())
    }

    pub fn object_list<T: RefType>() -> Self {
        Template::ObjectList(RefFactory::of::<T>())
    }

    /// Ref type the template produces, if it produces refs.
    pub fn ref_type(&self) -> Option<&'static str> {
        match self {
            Template::Scalar => None,
            Template::Object(factory) | Template::ObjectList(factory) => Some(factory.ref_type()),
        }
    }

    /// Convert loader output into a typed value.
    pub fn build(&self, raw: RawValue) -> Result<HardpointValue, String> {
        match (self, raw) {
            (Template::Scalar, RawValue::Scalar(value)) => Ok(HardpointValue::Scalar(value)),
            (Template::Object(factory), RawValue::Record(record)) => {
                Ok(HardpointValue::Object(record.map(|r| factory.build(r))))
            }
            (Template::ObjectList(factory), RawValue::Records(records)) => Ok(
                HardpointValue::ObjectList(records.into_iter().map(|r| factory.build(r)).collect()),
            ),
            (template, raw) => Err(format!(
                "{} template cannot hold {}",
                template.shape(),
                raw_shape(&raw)
            )),
        }
    }

    /// Whether a resolved value fits this template.
    pub fn accepts(&self, value: &HardpointValue) -> bool {
        match (self, value) {
            (Template::Scalar, HardpointValue::Scalar(_)) => true,
            (Template::Object(factory), HardpointValue::Object(handle)) => handle
                .iter()
                .all(|h| h.ref_type() == factory.ref_type()),
            (Template::ObjectList(factory), HardpointValue::ObjectList(handles)) => handles
                .iter()
                .all(|h| h.ref_type() == factory.ref_type()),
            _ => false,
        }
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Template::Scalar => "scalar",
            Template::Object(_) => "object",
            Template::ObjectList(_) => "object list",
        }
    }
}

fn raw_shape(raw: &RawValue) -> &'static str {
    match raw {
        RawValue::Scalar(_) => "a scalar",
        RawValue::Record(_) => "a single record",
        RawValue::Records(_) => "a record list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ObjectRef;
    use crate::testing::{note_record, NoteRef, TaskRef};
    use serde_json::json;

    #[test]
    fn test_object_list_preserves_source_order() {
        let template = Template::object_list::<NoteRef>();
        let value = template
            .build(RawValue::Records(vec![
                note_record(3, "c"),
                note_record(1, "a"),
                note_record(2, "b"),
            ]))
            .unwrap();

        let ids: Vec<_> = value.as_list().unwrap().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
        assert!(value
            .as_list()
            .unwrap()
            .iter()
            .all(|h| h.ref_type() == "note"));
        assert!(template.accepts(&value));
    }

    #[test]
    fn test_object_template() {
        let template = Template::object::<TaskRef>();
        assert_eq!(template.ref_type(), Some("task"));

        let raw = RawValue::Record(Some(note_record(5, "t")));
        let value = template.build(raw).unwrap();
        assert_eq!(value.object::<TaskRef>().and_then(|t| t.id()), Some(5));

        let nothing = template.build(RawValue::Record(None)).unwrap();
        assert!(matches!(nothing.as_object(), Some(None)));
        assert!(template.accepts(&nothing));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = Template::scalar()
            .build(RawValue::Records(vec![]))
            .unwrap_err();
        assert_eq!(err, "scalar template cannot hold a record list");

        let notes = Template::object_list::<NoteRef>()
            .build(RawValue::Records(vec![note_record(1, "a")]))
            .unwrap();
        assert!(!Template::object_list::<TaskRef>().accepts(&notes));
        assert!(!Template::scalar().accepts(&notes));
        assert!(Template::scalar().accepts(&HardpointValue::Scalar(json!(4))));
    }
}
