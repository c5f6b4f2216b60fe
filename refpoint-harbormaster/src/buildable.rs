//! Buildable refs.
//!
//! A buildable is the object a set of builds runs against (a revision diff,
//! a commit). Its builds are exposed through the `buildRefs` hardpoint.

use serde::Deserialize;
use std::sync::Arc;

use refpoint::{
    DisplayRef, HardpointSet, ObjectRef, Phid, RefHandle, RefType, RemoteRecord, Resolver, Result,
    Template,
};

use crate::build::BuildRef;

/// Builds run against this buildable, in source order.
pub const HARDPOINT_BUILDREFS: &str = "ref.buildable.buildRefs";

/// Typed view of a buildable's `fields` mapping.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildableFields {
    pub name: Option<String>,
    #[serde(rename = "objectPHID")]
    pub object_phid: Option<String>,
    #[serde(rename = "containerPHID")]
    pub container_phid: Option<String>,
    #[serde(rename = "isManual")]
    pub is_manual: bool,
}

#[derive(Debug)]
pub struct BuildableRef {
    record: RemoteRecord,
    phid: Option<Phid>,
    fields: BuildableFields,
    hardpoints: HardpointSet,
}

impl BuildableRef {
    pub fn fields(&self) -> &BuildableFields {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    /// PHID of the object being built (e.g. a revision).
    pub fn object_phid(&self) -> Option<&str> {
        self.fields.object_phid.as_deref()
    }

    /// Builds for this buildable, resolving them on first access.
    pub async fn build_refs(self: &Arc<Self>, resolver: &Resolver) -> Result<Vec<Arc<BuildRef>>> {
        let handle: RefHandle = self.clone();
        resolver
            .get_objects::<BuildRef>(&handle, HARDPOINT_BUILDREFS)
            .await
    }
}

impl ObjectRef for BuildableRef {
    fn ref_type(&self) -> &'static str {
        Self::REF_TYPE
    }

    fn id(&self) -> Option<u64> {
        self.record.id()
    }

    fn phid(&self) -> Option<&Phid> {
        self.phid.as_ref()
    }

    fn monogram(&self) -> String {
        match self.id() {
            Some(id) => format!("B{id}"),
            None => "B".to_string(),
        }
    }

    fn parameters(&self) -> &RemoteRecord {
        &self.record
    }

    fn hardpoints(&self) -> &HardpointSet {
        &self.hardpoints
    }

    fn as_display(&self) -> Option<&dyn DisplayRef> {
        Some(self)
    }
}

impl RefType for BuildableRef {
    const REF_TYPE: &'static str = "buildable";

    fn new_from_remote(record: RemoteRecord) -> Self {
        Self {
            phid: record.phid(),
            fields: record.decode_or_default("fields"),
            record,
            hardpoints: HardpointSet::new()
                .declare(HARDPOINT_BUILDREFS, Template::object_list::<BuildRef>()),
        }
    }
}

impl DisplayRef for BuildableRef {
    fn display_object_name(&self) -> String {
        self.monogram()
    }

    fn display_title(&self) -> Option<String> {
        self.name().map(str::to_string)
    }

    fn ref_display_name(&self) -> String {
        format!("Buildable \"{}\"", self.monogram())
    }
}
