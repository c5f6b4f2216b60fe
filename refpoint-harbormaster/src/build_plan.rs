//! Build plan refs.

use serde::Deserialize;

use refpoint::{DisplayRef, HardpointSet, ObjectRef, Phid, RefType, RemoteRecord};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildPlanFields {
    pub name: Option<String>,
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanStatus {
    pub value: String,
}

#[derive(Debug)]
pub struct BuildPlanRef {
    record: RemoteRecord,
    phid: Option<Phid>,
    fields: BuildPlanFields,
    hardpoints: HardpointSet,
}

impl BuildPlanRef {
    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn is_disabled(&self) -> bool {
        self.fields
            .status
            .as_ref()
            .is_some_and(|status| status.value == "disabled")
    }
}

impl ObjectRef for BuildPlanRef {
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
            Some(id) => format!("PLAN{id}"),
            None => "PLAN".to_string(),
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

impl RefType for BuildPlanRef {
    const REF_TYPE: &'static str = "buildplan";

    fn new_from_remote(record: RemoteRecord) -> Self {
        Self {
            phid: record.phid(),
            fields: record.decode_or_default("fields"),
            record,
            hardpoints: HardpointSet::new(),
        }
    }
}

impl DisplayRef for BuildPlanRef {
    fn display_object_name(&self) -> String {
        self.monogram()
    }

    fn display_title(&self) -> Option<String> {
        self.name().map(str::to_string)
    }

    fn ref_display_name(&self) -> String {
        format!("Build Plan \"{}\"", self.monogram())
    }
}
