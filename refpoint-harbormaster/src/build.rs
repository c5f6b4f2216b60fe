//! Build refs.

use serde::Deserialize;
use std::sync::Arc;

use refpoint::{
    DisplayRef, HardpointSet, ObjectRef, Phid, RefHandle, RefType, RemoteRecord, Resolver, Result,
    Template,
};

use crate::build_plan::BuildPlanRef;

/// The plan this build was started from.
pub const HARDPOINT_BUILDPLAN: &str = "ref.build.buildPlan";

/// Status values a build can no longer leave.
const TERMINAL_STATUSES: &[&str] = &["passed", "failed", "aborted", "error", "deadlocked"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildStatus {
    pub value: String,
    pub name: Option<String>,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.value.as_str())
    }
}

/// Typed view of a build's `fields` mapping.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildFields {
    pub name: Option<String>,
    #[serde(rename = "buildablePHID")]
    pub buildable_phid: Option<String>,
    #[serde(rename = "buildPlanPHID")]
    pub build_plan_phid: Option<String>,
    #[serde(rename = "buildStatus")]
    pub build_status: Option<BuildStatus>,
}

#[derive(Debug)]
pub struct BuildRef {
    record: RemoteRecord,
    phid: Option<Phid>,
    fields: BuildFields,
    hardpoints: HardpointSet,
}

impl BuildRef {
    pub fn fields(&self) -> &BuildFields {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn buildable_phid(&self) -> Option<&str> {
        self.fields.buildable_phid.as_deref()
    }

    pub fn build_plan_phid(&self) -> Option<&str> {
        self.fields.build_plan_phid.as_deref()
    }

    /// Raw status value, e.g. `"passed"`.
    pub fn status(&self) -> Option<&str> {
        self.fields
            .build_status
            .as_ref()
            .map(|status| status.value.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.fields
            .build_status
            .as_ref()
            .is_some_and(BuildStatus::is_terminal)
    }

    pub async fn build_plan(
        self: &Arc<Self>,
        resolver: &Resolver,
    ) -> Result<Option<Arc<BuildPlanRef>>> {
        let handle: RefHandle = self.clone();
        resolver
            .get_object::<BuildPlanRef>(&handle, HARDPOINT_BUILDPLAN)
            .await
    }
}

impl ObjectRef for BuildRef {
    fn ref_type(&self) -> &'static str {
        Self::REF_TYPE
    }

    fn id(&self) -> Option<u64> {
        self.record.id()
    }

    fn phid(&self) -> Option<&Phid> {
        self.phid.as_ref()
    }

    /// `HMBD<id>`, after the build PHID type.
    fn monogram(&self) -> String {
        match self.id() {
            Some(id) => format!("HMBD{id}"),
            None => "HMBD".to_string(),
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

impl RefType for BuildRef {
    const REF_TYPE: &'static str = "build";

    fn new_from_remote(record: RemoteRecord) -> Self {
        Self {
            phid: record.phid(),
            fields: record.decode_or_default("fields"),
            record,
            hardpoints: HardpointSet::new()
                .declare(HARDPOINT_BUILDPLAN, Template::object::<BuildPlanRef>()),
        }
    }
}

impl DisplayRef for BuildRef {
    fn display_object_name(&self) -> String {
        self.monogram()
    }

    fn display_title(&self) -> Option<String> {
        self.name().map(str::to_string)
    }

    fn ref_display_name(&self) -> String {
        format!("Build \"{}\"", self.monogram())
    }
}
